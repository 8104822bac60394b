use elbowforge::{detect_elbow, fit_kmeans, scale, InertiaCurve, KMeansSettings, Record};
use ndarray::Array2;
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = Record> {
    prop::array::uniform4(-1.0e6f64..1.0e6).prop_map(Record::from_features)
}

/// Values whose pairwise differences can exceed `f64::MAX`
fn extreme_value() -> impl Strategy<Value = f64> + Clone {
    (any::<bool>(), 1.0e307f64..f64::MAX).prop_map(|(neg, m)| if neg { -m } else { m })
}

proptest! {
    #[test]
    fn prop_scaled_values_in_unit_range(records in prop::collection::vec(record_strategy(), 1..40)) {
        let matrix = scale(&records).unwrap();

        prop_assert_eq!(matrix.n_rows(), records.len());
        for &v in matrix.features.iter() {
            prop_assert!(v.is_finite());
            prop_assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn prop_scaled_values_in_unit_range_at_f64_extremes(
        records in prop::collection::vec(
            prop::array::uniform4(extreme_value()).prop_map(Record::from_features),
            2..20
        )
    ) {
        let matrix = scale(&records).unwrap();
        for &v in matrix.features.iter() {
            prop_assert!(v.is_finite());
            prop_assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn prop_zero_variance_column_is_all_zero(
        records in prop::collection::vec(record_strategy(), 1..30),
        constant in -100.0f64..100.0,
        column in 0usize..4
    ) {
        let records: Vec<Record> = records
            .into_iter()
            .map(|r| {
                let mut f = r.features().unwrap();
                f[column] = constant;
                Record::from_features(f)
            })
            .collect();

        let matrix = scale(&records).unwrap();
        prop_assert!(matrix.features.column(column).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn prop_elbow_never_panics(values in prop::collection::vec(0.0f64..1.0e4, 0..12)) {
        let curve = InertiaCurve::from_values(1, &values);
        if let Some(k) = detect_elbow(&curve) {
            prop_assert!(values.len() >= 3);
            prop_assert!(k > 1 && k < values.len());
        }
    }

    #[test]
    fn prop_convex_decreasing_curve_has_interior_elbow(
        scale_factor in 1.0f64..1.0e4,
        ratio in 0.1f64..0.9,
        len in 3usize..12
    ) {
        let values: Vec<f64> = (1..=len).map(|k| scale_factor * ratio.powi(k as i32)).collect();
        let curve = InertiaCurve::from_values(1, &values);

        let k = detect_elbow(&curve);
        prop_assert!(k.is_some());
        let k = k.unwrap();
        prop_assert!(k > 1 && k < len);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_kmeans_all_assigned(
        data in prop::collection::vec(prop::array::uniform4(0.0f64..1.0), 1..20),
        k in 1usize..5
    ) {
        // Skip if k > n
        if k <= data.len() {
            let flat: Vec<f64> = data.iter().flatten().copied().collect();
            let features = Array2::from_shape_vec((data.len(), 4), flat).unwrap();
            let settings = KMeansSettings { n_init: 3, ..KMeansSettings::default() };
            let model = fit_kmeans(&features, k, &settings).unwrap();

            let labels = model.assign(&features);
            prop_assert_eq!(labels.len(), data.len());
            for &l in labels.iter() {
                prop_assert!(l < k);
            }
            prop_assert!(model.inertia >= 0.0);
        }
    }
}
