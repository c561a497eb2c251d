use lpquad_integrate::{
    IntegrateError, Interval, Polynomial, Quadrature, SampleRng, SampleSchedule, hit_or_miss, report,
};
use proptest::prelude::*;

fn demo() -> (Polynomial, Interval) {
    (Polynomial::demo(), Interval::new(0.0, 5.0).unwrap())
}

#[test]
fn reference_matches_exact_within_reported_error() {
    let (f, interval) = demo();
    let reference = Quadrature::new().integrate(&f, &interval);

    let exact = 230.0 / 3.0;
    assert!((reference.value - exact).abs() <= reference.abs_error);
    assert!((reference.value - 76.666_666).abs() < 1e-6);
}

#[test]
fn seeded_schedule_is_reproducible() {
    let (f, interval) = demo();
    let schedule = SampleSchedule::default().with_seed(1234);

    let first = report::run(&f, &interval, &Quadrature::new(), &schedule).unwrap();
    let second = report::run(&f, &interval, &Quadrature::new(), &schedule).unwrap();

    let a: Vec<f64> = first.monte_carlo.iter().map(|r| r.estimate.estimate).collect();
    let b: Vec<f64> = second.monte_carlo.iter().map(|r| r.estimate.estimate).collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 5);
}

#[test]
fn largest_run_lands_within_two_percent() {
    let (f, interval) = demo();
    let reference = Quadrature::new().integrate(&f, &interval).value;

    for seed in [1, 2, 3] {
        let est = hit_or_miss(&f, &interval, 1_000_000, &mut SampleRng::from_seed(seed)).unwrap();
        let rel = (est.estimate - reference).abs() / reference;
        assert!(rel < 0.02, "seed {seed}: {} vs {}", est.estimate, reference);
    }
}

#[test]
fn error_shrinks_with_more_samples() {
    let (f, interval) = demo();
    let runs = SampleSchedule::new(vec![100, 1_000_000]).with_seed(77).run(&f, &interval).unwrap();
    assert!(runs[1].std_error < runs[0].std_error / 50.0);
}

#[test]
fn reversed_bounds_are_rejected() {
    assert_eq!(
        Interval::new(5.0, 0.0).unwrap_err(),
        IntegrateError::InvalidBounds { lower: 5.0, upper: 0.0 }
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn estimate_stays_inside_box(num_samples in 1usize..2_000, seed in any::<u64>()) {
        let (f, interval) = demo();
        let est = hit_or_miss(&f, &interval, num_samples, &mut SampleRng::from_seed(seed)).unwrap();

        prop_assert!(est.estimate >= 0.0);
        prop_assert!(est.estimate <= est.box_area);
        prop_assert!(est.hits <= num_samples);
    }

    #[test]
    fn same_seed_same_estimate(num_samples in 1usize..500, seed in any::<u64>()) {
        let (f, interval) = demo();
        let a = hit_or_miss(&f, &interval, num_samples, &mut SampleRng::from_seed(seed)).unwrap();
        let b = hit_or_miss(&f, &interval, num_samples, &mut SampleRng::from_seed(seed)).unwrap();
        prop_assert_eq!(a, b);
    }
}
