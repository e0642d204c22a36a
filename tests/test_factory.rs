use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use qapopt::{
    factory::{
        FactoryConfig, FeatureFlags, OptimizerFactory, SolverFamily, ENABLE_ALL_SPECIALIZED,
        ENABLE_QAP_SPECIALIZED, FORCE_HEURISTIC,
    },
    optimizer::{Optimizer, OptimizerKind},
    problem::{Matrix, OptimizationProblem, ProblemType, ADJACENCY, CAPACITY, DEMAND, DISTANCE},
    qap::QapConfig,
    result::{Solution, SolverStatus},
};
use rayon::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn flags(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn qap_problem(n: usize) -> OptimizationProblem {
    let mut distance = Matrix::zeros(n, n);
    let mut flow = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            distance.set(i, j, i.abs_diff(j) as f64);
            if i != j {
                flow.set(i, j, ((i + j) % 5) as f64);
            }
        }
    }
    OptimizationProblem::qap(distance, flow)
}

fn problem_for(problem_type: ProblemType) -> OptimizationProblem {
    let square = Matrix::from_rows(vec![
        vec![0.0, 2.0, 9.0],
        vec![2.0, 0.0, 4.0],
        vec![9.0, 4.0, 0.0],
    ])
    .unwrap();
    match problem_type {
        ProblemType::QuadraticAssignment => qap_problem(4),
        ProblemType::WorkflowRouting => {
            OptimizationProblem::new(problem_type).with_data(DISTANCE, square)
        }
        ProblemType::ResourceAllocation => OptimizationProblem::new(problem_type)
            .with_data(DEMAND, Matrix::vector(vec![3.0, 1.0, 2.0]))
            .with_data(CAPACITY, Matrix::vector(vec![9.0])),
        ProblemType::NetworkTopology => {
            OptimizationProblem::new(problem_type).with_data(ADJACENCY, square)
        }
        ProblemType::AdversarialRobust | ProblemType::MultiObjective => {
            OptimizationProblem::new(problem_type).with_data("weights", square)
        }
    }
}

fn seeded_config() -> FactoryConfig {
    FactoryConfig::default().with_qap(
        QapConfig::builder()
            .max_iterations(500)
            .seed(9)
            .build(),
    )
}

#[test]
fn test_fallback_for_every_type_when_flags_off() {
    init_tracing();
    let factory = OptimizerFactory::new(seeded_config());

    for problem_type in ProblemType::ALL {
        assert_eq!(factory.optimizer_for(problem_type), OptimizerKind::HeuristicFallback);

        let problem = problem_for(problem_type);
        let result = factory.solve(&problem);
        assert_eq!(result.status, SolverStatus::Fallback, "{}", problem_type);
        assert!(result.metadata.contains_key("strategy"));
    }
}

#[test]
fn test_fallback_solutions_have_expected_shape() {
    let factory = OptimizerFactory::new(seeded_config());

    let qap = factory.solve(&problem_for(ProblemType::QuadraticAssignment));
    assert!(qap.solution.unwrap().is_valid_permutation(4));
    assert_eq!(qap.objective_value, None);

    let route = factory.solve(&problem_for(ProblemType::WorkflowRouting));
    assert_eq!(route.permutation(), Some(&[0, 1, 2][..]));

    let allocation = factory.solve(&problem_for(ProblemType::ResourceAllocation));
    assert_eq!(allocation.solution, Some(Solution::Allocation(vec![3.0, 3.0, 3.0])));
}

#[test]
fn test_empty_update_is_idempotent() {
    let factory = OptimizerFactory::new(seeded_config());
    let before = factory.registry();
    factory.update_feature_flags(&HashMap::new());
    assert_eq!(factory.registry(), before);

    factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, true)]));
    let enabled = factory.registry();
    factory.update_feature_flags(&HashMap::new());
    factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, true)]));
    assert_eq!(factory.registry(), enabled);
}

#[cfg(feature = "qap")]
#[test]
fn test_qap_flag_registers_specialized_solver() {
    let factory = OptimizerFactory::new(seeded_config());
    factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, true)]));

    assert_eq!(
        factory.optimizer_for(ProblemType::QuadraticAssignment),
        OptimizerKind::QapSolver
    );
    assert_eq!(
        factory.optimizer_for(ProblemType::WorkflowRouting),
        OptimizerKind::HeuristicFallback
    );

    let result = factory.solve(&qap_problem(6));
    assert_eq!(result.status, SolverStatus::Success);
    assert!(result.solution.unwrap().is_valid_permutation(6));
    assert_eq!(result.metadata["solver"].as_str(), Some("qap_solver"));
}

#[cfg(feature = "qap")]
#[test]
fn test_enable_all_only_upgrades_available_families() {
    let config = seeded_config().with_flags(FeatureFlags::from_map(&flags(&[(
        ENABLE_ALL_SPECIALIZED,
        true,
    )])));
    let factory = OptimizerFactory::new(config);

    let registry = factory.registry();
    assert_eq!(
        registry[&ProblemType::QuadraticAssignment],
        OptimizerKind::QapSolver
    );
    for problem_type in ProblemType::ALL {
        if problem_type != ProblemType::QuadraticAssignment {
            // MetaLearning covers every type but has no implementation here,
            // so it must not demote the QAP entry either.
            assert_eq!(registry[&problem_type], OptimizerKind::HeuristicFallback);
        }
    }
}

#[test]
fn test_force_heuristic_overrides_everything() {
    let config = seeded_config().with_flags(
        FeatureFlags::all_specialized().with_family(SolverFamily::Qap, true),
    );
    let factory = OptimizerFactory::new(config);
    factory.update_feature_flags(&flags(&[(FORCE_HEURISTIC, true)]));

    assert!(factory
        .registry()
        .values()
        .all(|kind| *kind == OptimizerKind::HeuristicFallback));
    assert_eq!(
        factory.solve(&qap_problem(5)).status,
        SolverStatus::Fallback
    );
}

#[test]
fn test_construction_failure_falls_back() {
    init_tracing();
    let bad_qap = QapConfig::builder().cooling_rate(2.0).seed(1).build();
    let config = FactoryConfig::default()
        .with_flags(FeatureFlags::default().with_family(SolverFamily::Qap, true))
        .with_qap(bad_qap);
    let factory = OptimizerFactory::new(config);

    let problem = qap_problem(5);
    let optimizer = factory.create_optimizer(&problem, None, None);
    assert_eq!(optimizer.name(), "heuristic_fallback");

    let result = factory.solve(&problem);
    assert_eq!(result.status, SolverStatus::Fallback);
    assert!(result.solution.unwrap().is_valid_permutation(5));
}

#[test]
fn test_mismatched_dimensions_fail_through_factory() {
    let problem = OptimizationProblem::qap(Matrix::zeros(5, 5), Matrix::zeros(4, 4));
    for qap_enabled in [false, true] {
        let factory = OptimizerFactory::new(seeded_config());
        factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, qap_enabled)]));

        let optimizer = factory.create_optimizer(&problem, None, None);
        let validation = optimizer.validate_problem(&problem);
        assert!(!validation.valid);
        assert!(validation.error.is_some());

        let result = factory.solve(&problem);
        assert_eq!(result.status, SolverStatus::Failed);
        assert!(result.error().is_some());
    }
}

#[cfg(feature = "qap")]
#[test]
fn test_create_optimizer_overrides() {
    let factory = OptimizerFactory::new(
        seeded_config().with_default_timeout(Some(Duration::from_secs(60))),
    );
    factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, true)]));

    let problem = qap_problem(30);
    let mut optimizer = factory.create_optimizer(&problem, Some(true), Some(Duration::ZERO));
    let result = optimizer.solve(&problem);
    assert_eq!(result.status, SolverStatus::Timeout);
    assert_eq!(result.metadata["gpu_requested"].as_bool(), Some(true));
    assert!(result.solution.unwrap().is_valid_permutation(30));
}

#[test]
fn test_factory_shared_across_threads() {
    let factory = Arc::new(OptimizerFactory::new(seeded_config()));

    let statuses: Vec<SolverStatus> = (0..16usize)
        .into_par_iter()
        .map(|i| {
            if i % 4 == 0 {
                factory.update_feature_flags(&flags(&[(ENABLE_QAP_SPECIALIZED, i % 8 == 0)]));
            }
            factory.solve(&qap_problem(4 + i % 3)).status
        })
        .collect();

    assert!(statuses.iter().all(|status| status.is_usable()));
}

#[test]
fn test_config_from_maps() {
    let params = HashMap::from([
        ("max_iterations".to_string(), "250".to_string()),
        ("seed".to_string(), "4".to_string()),
    ]);
    let config =
        FactoryConfig::from_maps(&flags(&[(ENABLE_QAP_SPECIALIZED, true)]), &params).unwrap();
    assert_eq!(config.qap.max_iterations, 250);
    assert_eq!(config.qap.seed, Some(4));
    assert!(config.flags.is_enabled(SolverFamily::Qap));

    let bad = HashMap::from([("cooling_rate".to_string(), "1.5".to_string())]);
    assert!(FactoryConfig::from_maps(&HashMap::new(), &bad).is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_results_serialize() {
    let factory = OptimizerFactory::new(seeded_config());
    let result = factory.solve(&qap_problem(4));

    let json = serde_json::to_string(&result).unwrap();
    let back: qapopt::OptimizationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, result.status);
    assert_eq!(back.solution, result.solution);

    let config_json = serde_json::to_string(factory.config()).unwrap();
    assert!(config_json.contains("max_iterations"));
}
