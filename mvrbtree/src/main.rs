use mvrbtree::SimulationSettings;
use mvrbtree::simulation::{Simulator, SimulatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mvrbtree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let settings = match SimulationSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: seed={}, operations={}, page_size={}, load_factor={}",
        settings.seed,
        settings.operations,
        settings.tree.page_size,
        settings.tree.load_factor
    );

    let mut simulator = match Simulator::new(SimulatorConfig::from(settings)) {
        Ok(simulator) => simulator,
        Err(e) => {
            tracing::error!("Failed to create tree: {e}");
            std::process::exit(1);
        }
    };

    let result = simulator.run();
    let stats = result.stats;
    tracing::info!(
        "lookups={}, cache_hit_ratio={:.3}, splits={}, rotations={}, pages_removed={}",
        stats.lookups,
        stats.cache_hit_ratio(),
        stats.splits,
        stats.rotations,
        stats.nodes_removed
    );

    if let Some(error) = &result.error {
        tracing::error!("Simulation aborted: {error}");
    }
    for violation in &result.invariant_violations {
        tracing::error!(
            "op {}: {} ({})",
            violation.operation_index,
            violation.description,
            violation.context
        );
    }

    if !result.passed() {
        tracing::error!("Simulation with seed {} failed", result.seed);
        std::process::exit(1);
    }
    tracing::info!(
        "Simulation with seed {} passed, {} entries remain",
        result.seed,
        result.final_len
    );
}
