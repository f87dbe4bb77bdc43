#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use synapse::initialization::UnitInputs;
    use synapse::network::{Network, TrainingMethod};
    use synapse::train::PatternTable;
    use synapse::transfer::TransferKind;

    // Strategy for generating valid layer sizes
    fn layer_sizes_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..=8, 2..=4)
    }

    // Strategy for generating finite input vectors
    fn input_strategy(size: usize) -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-10.0f32..10.0, size)
    }

    fn seeded_net(layer_sizes: &[usize], seed: u64) -> Network {
        let mut net = Network::new(layer_sizes, true);
        let mut rng = StdRng::seed_from_u64(seed);
        net.nguyen_widrow_init_layers(1, layer_sizes.len() - 1, &UnitInputs, &mut rng);
        net
    }

    proptest! {
        #[test]
        fn test_forward_pass_output_shape(layer_sizes in layer_sizes_strategy()) {
            let mut net = Network::new(&layer_sizes, true);
            net.set_inputs(&vec![0.5; layer_sizes[0]]);
            net.feed_forward();
            prop_assert_eq!(net.output_values().len(), layer_sizes[layer_sizes.len() - 1]);
        }

        #[test]
        fn test_forward_pass_deterministic(
            input in input_strategy(4),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[4, 5, 2], seed);
            net.set_inputs(&input);
            net.feed_forward();
            let first = net.output_values();
            net.feed_forward();
            prop_assert_eq!(first, net.output_values());
        }

        #[test]
        fn test_sigmoid_outputs_bounded(
            input in input_strategy(3),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[3, 4, 2], seed);
            net.set_inputs(&input);
            net.feed_forward();
            let (lo, hi) = TransferKind::SigmoidPos.output_range();
            for i in 0..net.num_outputs() {
                let out = net.output_value(i);
                prop_assert!(out >= lo && out <= hi, "output out of range: {}", out);
            }
        }

        #[test]
        fn test_classify_index_in_bounds(
            input in input_strategy(2),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[2, 3, 4], seed);
            if let Some(class) = net.classify(&input) {
                prop_assert!(class < net.num_outputs());
            }
        }

        #[test]
        fn test_group_classes_within_groups(
            input in input_strategy(2),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[2, 3, 5], seed);
            let sizes = [2usize, 3];
            let mut classes = [None; 2];
            net.classify_groups(&input, &sizes, &mut classes);
            for (g, class) in classes.iter().enumerate() {
                if let Some(c) = class {
                    prop_assert!(*c < sizes[g]);
                }
            }
        }

        #[test]
        fn test_probabilities_form_distributions(
            input in input_strategy(2),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[2, 3, 5], seed);
            let sizes = [2usize, 3];
            let mut probs = [0.0f64; 5];
            prop_assert!(net.classify_probabilities(&input, &sizes, &mut probs));
            for &p in &probs {
                prop_assert!((0.0..=1.0).contains(&p), "probability out of range: {}", p);
            }
            prop_assert!((probs[0] + probs[1] - 1.0).abs() < 1e-9);
            prop_assert!((probs[2] + probs[3] + probs[4] - 1.0).abs() < 1e-9);
        }

        #[test]
        fn test_stream_round_trip_preserves_outputs(
            input in input_strategy(3),
            seed in 0u64..1000
        ) {
            let mut net = seeded_net(&[3, 4, 2], seed);
            let mut buf = Vec::new();
            net.save_to_stream(&mut buf).unwrap();
            let mut loaded = Network::from_stream(&mut buf.as_slice()).unwrap();
            net.set_inputs(&input);
            loaded.set_inputs(&input);
            net.feed_forward();
            loaded.feed_forward();
            prop_assert_eq!(net.output_values(), loaded.output_values());
        }

        #[test]
        fn test_measured_error_non_negative(
            inputs in prop::collection::vec(input_strategy(2), 1..6),
            seed in 0u64..1000
        ) {
            let mut patterns = PatternTable::new();
            for (n, row) in inputs.iter().enumerate() {
                patterns.push(row.clone(), vec![n % 2 == 0]);
            }
            let mut net = seeded_net(&[2, 3, 1], seed);
            let err = net.measure_error(patterns.len(), &patterns);
            prop_assert!(err.is_finite());
            prop_assert!(err >= 0.0);
        }

        #[test]
        fn test_levenberg_mu_stays_above_floor(
            seed in 0u64..200
        ) {
            let mut patterns = PatternTable::new();
            patterns.push(vec![-1.0, -1.0], vec![false]);
            patterns.push(vec![1.0, 1.0], vec![true]);
            let mut net = seeded_net(&[2, 2, 1], seed);
            net.options.method = TrainingMethod::LevenbergMarquardt;
            net.train(patterns.len(), &patterns, |epoch, _| epoch >= 10);
            prop_assert!(net.options.mu >= net.options.mu_min);
        }
    }
}
