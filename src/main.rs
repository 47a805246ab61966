//! Novelty search CLI - Run a search from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use novelty_search::{
    compute::domains::{
        GridFactory, GridMap, ScalarFactory, ScalarSolution, VectorFactory, VectorSolution,
        VectorSpace,
    },
    compute::{NoveltySearcher, SearchError, Solution, SolutionFactory},
    schema::{DomainConfig, RunConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Run a constrained novelty search from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  generations  Number of generations (default: from config)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = RunConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let generations = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.search.generations);

    let seed = config.search.random_seed.unwrap_or_else(rand::random);
    log::info!("Random seed: {}", seed);
    let rng = StdRng::seed_from_u64(seed);

    println!("Novelty Search");
    println!("==============");
    println!(
        "Populations: {} feasible, {} infeasible",
        config.search.feasible_size, config.search.infeasible_size
    );
    println!(
        "Neighbours: {}, archive per generation: {}, minimum novelty: {}",
        config.search.options.number_of_neighbours,
        config.search.options.add_to_archive,
        config.search.options.minimum_novelty
    );
    println!("Generations: {}", generations);
    println!("Seed: {}", seed);
    println!();

    let result = match &config.domain {
        DomainConfig::Scalar(domain) => {
            println!("Domain: scalar in [{}, {}]", domain.min, domain.max);
            run_domain::<ScalarSolution, _>(&config, generations, &ScalarFactory::new(domain), rng)
        }
        DomainConfig::Vector(domain) => {
            println!("Domain: {}-dimensional vector", domain.lower.len());
            let space = Arc::new(VectorSpace::from(domain));
            let factory = VectorFactory::new(space, domain.spread);
            run_domain::<VectorSolution, _>(&config, generations, &factory, rng)
        }
        DomainConfig::Grid(domain) => {
            println!(
                "Domain: {}x{} grid, open share [{}, {}]",
                domain.width, domain.height, domain.min_open, domain.max_open
            );
            run_domain::<GridMap, _>(&config, generations, &GridFactory::new(domain), rng)
        }
    };

    if let Err(e) = result {
        eprintln!("Search failed: {}", e);
        std::process::exit(1);
    }
}

fn run_domain<S, F>(
    config: &RunConfig,
    generations: usize,
    factory: &F,
    rng: StdRng,
) -> Result<(), SearchError>
where
    S: Solution + Serialize + Display,
    F: SolutionFactory<S>,
{
    println!();
    println!("Seeding populations...");
    let mut searcher: NoveltySearcher<S> = NoveltySearcher::seed(&config.search, factory, rng)?;
    println!("  Initial archive: {}", searcher.archive().len());
    println!();

    let interval = (generations / 10).max(1);
    println!("Running search...");
    let summary = searcher.run_with_callback(generations, |report| {
        if report.generation % interval == 0 {
            let closest = report
                .best_distance_to_feasibility
                .map(|d| format!("{:.4}", d))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  Generation {}: archive={} (+{}), best novelty={:.4}, mean={:.4}, migrants={}/{}, closest infeasible={}",
                report.generation,
                report.archive_size,
                report.archived,
                report.best_novelty,
                report.mean_novelty,
                report.feasible_to_infeasible,
                report.infeasible_to_feasible,
                closest
            );
        }
    })?;

    println!();
    println!("Summary:");
    println!("  Generations: {} ({:?})", summary.generations, summary.stop_reason);
    println!("  Archive size: {}", summary.archive_size);
    println!(
        "  Migrations: {} feasible -> infeasible, {} infeasible -> feasible",
        summary.feasible_to_infeasible, summary.infeasible_to_feasible
    );
    println!(
        "  Time: {:.2}s ({:.1} generations/s)",
        summary.elapsed_seconds,
        summary.generations as f64 / summary.elapsed_seconds.max(f64::EPSILON)
    );

    let shown = searcher.archive().latest(3);
    if !shown.is_empty() {
        println!();
        println!("Most recently archived:");
        for candidate in shown {
            println!(
                "  #{} (generation {}, novelty {:.4}):",
                candidate.id, candidate.generation, candidate.novelty
            );
            println!("{}", candidate.solution);
        }
    }

    if let Some(dir) = &config.output_dir {
        let paths = searcher.archive().save_to_dir(dir)?;
        println!();
        println!("Exported {} candidates to {}", paths.len(), dir.display());
    }

    Ok(())
}

fn print_example_config() {
    let config = RunConfig::default();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|e| {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        })
    );
}
