#[cfg(test)]
mod tests {
    use payroute_engine::{
        Cents, ConfigError, EngineConfig, NoEligiblePolicy, PaymentMethod, Processor, ProcessorRouter,
        ProcessorSet, RoutingError, ScoringWeights, SimulationConfig, SimulationError, Simulator,
        Transaction,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn processor(name: &str, pct: Decimal, flat: i64, days: u32, success: Decimal) -> Processor {
        Processor {
            name: name.to_string(),
            fee_percentage: pct,
            fee_flat_cents: Cents(flat),
            settlement_time_days: days,
            success_rate: success,
            supports_card: true,
            supports_ach: false,
            instant_payout: false,
        }
    }

    fn simulator(processors: Vec<Processor>, reference: &str, simulation: SimulationConfig) -> Simulator {
        let set = ProcessorSet::new(processors, reference).expect("test: valid processors");
        let router = ProcessorRouter::new(set, ScoringWeights::default()).expect("test: default weights");
        Simulator::new(router, simulation).expect("test: valid simulation config")
    }

    fn baseline() -> Simulator {
        Simulator::from_config(EngineConfig::baseline()).expect("test: baseline is valid")
    }

    // ========== Selector end-to-end ==========

    #[test]
    fn test_reference_not_selected_when_cheaper_card_processors_exist() {
        let sim = baseline();
        let chosen = sim
            .router()
            .select(Cents(2500), PaymentMethod::Card, 0.1)
            .expect("card is routable");
        assert_ne!(chosen.name, "Stripe");
        assert!(chosen.name == "LocalProcessorA" || chosen.name == "FastPayout");
    }

    #[test]
    fn test_shipped_config_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/processors.json");
        let config = EngineConfig::from_path(path).expect("shipped config is valid");
        assert_eq!(config.processors.len(), 4);
        assert_eq!(config.processors.reference().name, "Stripe");
    }

    // ========== Harness edge cases ==========

    #[test]
    fn test_zero_transactions() {
        let result = baseline().run_seeded(0, 1).expect("empty run succeeds");
        assert_eq!(result.total_selections(), 0);
        assert_eq!(result.reduction_pct, 0.0);
        assert_eq!(result.mean_reference_fee, 0.0);
        assert_eq!(result.mean_chosen_fee, 0.0);
    }

    #[test]
    fn test_single_transaction() {
        let sim = baseline();
        let tx = Transaction::new(2500, PaymentMethod::Card, 0.1);
        let result = sim.run_transactions([tx]).expect("single run succeeds");

        assert_eq!(result.total_selections(), 1);
        // Stripe charges 102c; FastPayout wins at 95c.
        assert_eq!(result.mean_reference_fee, 102.0);
        assert_eq!(result.mean_chosen_fee, 95.0);
        assert_eq!(result.selection_counts.get("FastPayout"), Some(&1));
        assert!((result.reduction_pct - 7.0 / 102.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_strictly_cheaper_choice_gives_positive_reduction() {
        let sim = simulator(
            vec![
                processor("Expensive", dec!(0.05), 50, 2, dec!(0.95)),
                processor("Cheap", dec!(0.01), 5, 0, dec!(0.99)),
            ],
            "Expensive",
            SimulationConfig::default(),
        );
        let result = sim.run_seeded(1000, 5).expect("run succeeds");
        assert_eq!(result.selection_counts.get("Cheap"), Some(&1000));
        assert!(result.reduction_pct > 0.0);
        assert!(result.saving_per_transaction.min > 0.0);
    }

    #[test]
    fn test_baseline_card_population() {
        let result = baseline().run_seeded(5000, 0).expect("run succeeds");
        assert_eq!(result.total_selections(), 5000);
        assert!(result.reduction_pct > 0.0, "routing should beat the reference on average");
        // ACHProvider is not card eligible; Stripe is dominated by LocalProcessorA for card.
        assert!(!result.selection_counts.contains_key("ACHProvider"));
        assert!(!result.selection_counts.contains_key("Stripe"));
        assert_eq!(result.fallback_selections, 0);
    }

    // ========== NoEligibleProcessor policy ==========

    fn ach_only_population(policy: NoEligiblePolicy) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.method_weights.card = 0.0;
        config.method_weights.ach = 1.0;
        config.on_no_eligible = policy;
        config
    }

    #[test]
    fn test_abort_policy_surfaces_no_eligible_processor() {
        let sim = simulator(
            vec![processor("CardOnly", dec!(0.02), 20, 1, dec!(0.97))],
            "CardOnly",
            ach_only_population(NoEligiblePolicy::Abort),
        );
        let err = sim.run_seeded(10, 3);
        assert!(
            matches!(
                err,
                Err(SimulationError::Routing {
                    index: 0,
                    source: RoutingError::NoEligibleProcessor(PaymentMethod::Ach),
                    ..
                })
            ),
            "expected abort on first transaction, got {err:?}"
        );
    }

    #[test]
    fn test_skip_policy_counts_skipped_transactions() {
        let sim = simulator(
            vec![processor("CardOnly", dec!(0.02), 20, 1, dec!(0.97))],
            "CardOnly",
            ach_only_population(NoEligiblePolicy::Skip),
        );
        let result = sim.run_seeded(10, 3).expect("skip policy never aborts");
        assert_eq!(result.requested, 10);
        assert_eq!(result.skipped, 10);
        assert_eq!(result.simulated, 0);
        assert_eq!(result.reduction_pct, 0.0);
    }

    #[test]
    fn test_skip_policy_with_mixed_methods() {
        let mut config = ach_only_population(NoEligiblePolicy::Skip);
        config.method_weights.card = 1.0;
        let sim = simulator(
            vec![processor("CardOnly", dec!(0.02), 20, 1, dec!(0.97))],
            "CardOnly",
            config,
        );
        let result = sim.run_seeded(400, 8).expect("skip policy never aborts");
        assert_eq!(result.simulated + result.skipped, 400);
        assert!(result.skipped > 0);
        assert!(result.simulated > 0);
        assert_eq!(result.total_selections(), result.simulated);
    }

    // ========== Configuration ==========

    #[test]
    fn test_json_config_drives_population() {
        let json = r#"{
            "reference_processor": "Stripe",
            "processors": [
                {"name": "Stripe", "fee_percentage": 0.029, "fee_flat_cents": 30,
                 "settlement_time_days": 2, "success_rate": 0.98,
                 "supports_card": true, "supports_ach": true},
                {"name": "ACHProvider", "fee_percentage": 0.008, "fee_flat_cents": 25,
                 "settlement_time_days": 3, "success_rate": 0.99, "supports_ach": true}
            ],
            "simulation": {
                "amounts_cents": [2500],
                "method_weights": {"card": 0.0, "ach": 1.0}
            }
        }"#;
        let config = EngineConfig::from_json_str(json).expect("valid config");
        let result = Simulator::from_config(config)
            .expect("valid simulator")
            .run_seeded(100, 21)
            .expect("run succeeds");
        assert_eq!(result.total_selections(), 100);
        assert_eq!(result.mean_reference_fee, 102.0);
        assert!(result.selection_counts.contains_key("ACHProvider"));
    }

    #[test]
    fn test_invalid_configuration_is_fatal() {
        let json = r#"{
            "reference_processor": "Nobody",
            "processors": [
                {"name": "A", "fee_percentage": 0.02, "fee_flat_cents": 10,
                 "settlement_time_days": 1, "success_rate": 0.95, "supports_card": true}
            ]
        }"#;
        assert!(matches!(
            EngineConfig::from_json_str(json),
            Err(ConfigError::UnknownReference(_))
        ));

        let json = r#"{
            "reference_processor": "A",
            "processors": [
                {"name": "A", "fee_percentage": -0.02, "fee_flat_cents": 10,
                 "settlement_time_days": 1, "success_rate": 0.95, "supports_card": true}
            ]
        }"#;
        assert!(matches!(
            EngineConfig::from_json_str(json),
            Err(ConfigError::OutOfRange { field: "fee_percentage", .. })
        ));
    }
}
