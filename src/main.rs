use exbsim::{Method, OutcomeAnalyzer, Scenario, ScenarioConfig};
use exbsim::{bench_ensemble, bench_methods};
use exbsim::{reference_particle, sweep};
use exbsim::export::csv::{write_convergence, write_histogram, write_initial_conditions, write_trajectory};

use anyhow::{Context, Result};
use clap::Parser;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "part_b.yaml")]
    file_name: String,

    /// Override the scenario's output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Override the integration method (euler, midpoint, rk4, analytic)
    #[arg(long)]
    method: Option<String>,

    /// Time the integrators instead of running the scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    // a path that exists is taken as-is, otherwise look in the bundled scenarios
    let direct = PathBuf::from(file_name);
    let config_path = if direct.is_file() {
        direct
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };

    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn run_convergence(scenario: &Scenario, out: &Path) -> Result<()> {
    let Some(study) = &scenario.convergence else {
        return Ok(());
    };

    // one full trajectory per method at the configured dt
    for &method in &study.methods {
        let particle = reference_particle((*scenario.parameters).clone().with_method(method))?;
        write_trajectory(&out.join(format!("{method}.csv")), &particle)?;
    }

    let rows = sweep(&scenario.parameters, &study.methods, &study.dts)?;
    for r in &rows {
        log::info!(
            "{:>8} dt = {:e}: position error {:e}, velocity error {:e}",
            r.method.name(),
            r.dt,
            r.position_error,
            r.velocity_error
        );
    }
    write_convergence(&out.join("convergence.csv"), &rows)?;

    Ok(())
}

fn run_filter(scenario: &Scenario, out: &Path) -> Result<()> {
    let Some(study) = &scenario.filter else {
        return Ok(());
    };

    let mut sim = study.build_simulation(scenario.parameters.clone())?;
    sim.run(study.mode);

    let analyzer = OutcomeAnalyzer::new(&sim);
    let anomalies = analyzer.anomaly_count();
    match analyzer.passing_percentage() {
        Some(pct) => log::info!("passing percentage: {pct:.3}% ({anomalies} anomalous particles excluded)"),
        None => log::warn!("no passing percentage: all {anomalies} particles are anomalous"),
    }

    let histogram = analyzer.exit_velocity_histogram(study.bins)?;
    write_histogram(&out.join("final_velocity_histogram.csv"), &histogram)?;
    write_initial_conditions(&out.join("initial_conditions.csv"), &analyzer.initial_conditions(true))?;

    let exemplars = analyzer.exemplars();
    for (label, index) in [("passed", exemplars.passed), ("crashed", exemplars.crashed)] {
        if let Some(particle) = index.and_then(|i| sim.particle(i)) {
            write_trajectory(&out.join(format!("{} {label}.csv", scenario.parameters.method())), particle)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_methods()?;
        bench_ensemble()?;
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg).context("invalid scenario")?;

    if let Some(name) = &args.method {
        let method: Method = name.parse()?;
        scenario = scenario.with_method(method);
    }
    if let Some(dir) = args.out_dir {
        scenario.output_dir = dir;
    }

    fs::create_dir_all(&scenario.output_dir)
        .with_context(|| format!("creating {}", scenario.output_dir.display()))?;

    run_convergence(&scenario, &scenario.output_dir)?;
    run_filter(&scenario, &scenario.output_dir)?;

    Ok(())
}
