use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use zombie_arena_lib::app::{self, Arena};
use zombie_arena_lib::model::breeding::{offspring_name, rarity_of, BreedingEngine, BreedingParent};
use zombie_arena_lib::model::chain::{ChainClient, LocalChain};
use zombie_arena_lib::model::config::ArenaConfig;
use zombie_arena_lib::model::genetics::{parse_genome, random_genome};
use zombie_arena_lib::model::metrics::init_logging;
use zombie_arena_lib::model::persistence::{read_json_file, MemoryStore};
use zombie_arena_lib::model::ranking::{RankingAggregator, RankingOverlay};
use zombie_arena_lib::model::state::{BattleStatus, Creature, CreatureSnapshot, Genome, Trait};
use zombie_arena_lib::model::GenomeLogic;

#[derive(Parser, Debug)]
#[command(author, version, about = "Zombie arena simulation and ranking engine", long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the traits a genome expresses
    Traits { genome: String },
    /// Breed two genomes and show the offspring
    Breed {
        genome_a: String,
        genome_b: String,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Measure the empirical mutation rate over many breedings
    MutationRate {
        #[arg(long, default_value_t = 100_000)]
        trials: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Rank a JSON snapshot of creatures
    Leaderboard {
        snapshot: String,
        /// Account shown as "You"
        #[arg(long)]
        viewer: Option<String>,
        #[arg(long, default_value_t = 50)]
        top: usize,
    },
    /// Run the matchmaking queue against an in-memory chain
    Matchmake {
        #[arg(long, default_value_t = 3)]
        players: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = ArenaConfig::load_or_default(&args.config)?;

    match args.command {
        Command::Traits { genome } => show_traits(&genome),
        Command::Breed {
            genome_a,
            genome_b,
            seed,
        } => breed(&config, &genome_a, &genome_b, seed),
        Command::MutationRate { trials, seed } => mutation_rate(&config, trials, seed),
        Command::Leaderboard {
            snapshot,
            viewer,
            top,
        } => leaderboard(&config, &snapshot, viewer, top),
        Command::Matchmake { players } => matchmake(config, players).await,
    }
}

fn show_traits(input: &str) -> Result<()> {
    let genome = parse_genome(input)?;
    let expressed = genome.expressed_traits();
    for t in Trait::ALL {
        println!("{:<13} {:>3}", t.name(), expressed.get(t));
    }
    println!("rarity        {}", rarity_of(&expressed));
    Ok(())
}

fn demo_parent(id: u64, genome: Genome) -> BreedingParent {
    BreedingParent::new(
        Creature {
            id,
            owner: "0xdemo".to_string(),
            name: format!("Parent {}", id),
            genome,
            level: 2,
            win_count: 0,
            loss_count: 0,
            ready_time: 0,
        },
        None,
    )
}

fn breed(config: &ArenaConfig, a: &str, b: &str, seed: Option<u64>) -> Result<()> {
    let parent_a = demo_parent(1, parse_genome(a)?);
    let parent_b = demo_parent(2, parse_genome(b)?);
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => config.make_rng(),
    };

    let engine = BreedingEngine::new(config);
    let offspring = engine.breed(&parent_a, &parent_b, app::now(), &mut rng)?;
    println!("name     {}", offspring_name(&mut rng));
    println!("genome   {}", offspring.genome);
    println!("rarity   {}", rarity_of(&offspring.traits));
    println!("mutated  {}", offspring.is_mutated);
    println!("{}", serde_json::to_string_pretty(&offspring.traits)?);
    Ok(())
}

fn mutation_rate(config: &ArenaConfig, trials: u32, seed: u64) -> Result<()> {
    anyhow::ensure!(trials > 0, "Trials must be positive");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let engine = BreedingEngine::new(config);
    let now = app::now();

    let mut mutations = 0u32;
    for _ in 0..trials {
        let a = demo_parent(1, random_genome(&mut rng));
        let b = demo_parent(2, random_genome(&mut rng));
        if engine.breed(&a, &b, now, &mut rng)?.is_mutated {
            mutations += 1;
        }
    }
    let rate = f64::from(mutations) / f64::from(trials);
    println!(
        "{} mutations in {} breedings: {:.3}% (configured {:.3}%)",
        mutations,
        trials,
        rate * 100.0,
        config.genetics.mutation_chance * 100.0
    );
    Ok(())
}

fn leaderboard(config: &ArenaConfig, path: &str, viewer: Option<String>, top: usize) -> Result<()> {
    let snapshot: Vec<CreatureSnapshot> = read_json_file(path)?;
    let overlay = RankingOverlay {
        viewer,
        ..Default::default()
    };
    let board = RankingAggregator::new(config.ranking.clone()).aggregate(&snapshot, &overlay);

    println!("{:>4}  {:<16} {:>5} {:>7} {:>5} {:>6} {:>7}", "rank", "player", "level", "zombies", "wins", "losses", "win%");
    for p in board.top_players(top) {
        println!(
            "{:>4}  {:<16} {:>5} {:>7} {:>5} {:>6} {:>6.1}%",
            p.rank,
            p.name,
            p.level,
            p.total_zombies,
            p.wins,
            p.losses,
            p.win_rate * 100.0
        );
    }
    println!();
    println!("{:>4}  {:>8} {:>5} {:>6} {:<10}", "rank", "zombie", "level", "power", "rarity");
    for c in board.top_creatures(config.ranking.top_creatures.min(top)) {
        println!(
            "{:>4}  {:>8} {:>5} {:>6} {:<10}",
            c.rank, c.id, c.level, c.power_level, c.rarity
        );
    }
    println!();
    println!(
        "{} players, {} zombies, {} battles, average level {:.1}",
        board.stats.total_players,
        board.stats.total_zombies,
        board.stats.total_battles,
        board.stats.average_level
    );
    Ok(())
}

async fn matchmake(config: ArenaConfig, players: usize) -> Result<()> {
    let mut rng = config.make_rng();
    let chain = Arc::new(LocalChain::new(config.seed.unwrap_or(0)));
    let mut entrants = Vec::with_capacity(players);
    for i in 0..players {
        let owner = format!("0x{:040x}", i + 1);
        let id = chain.mint(&owner, &format!("Zombie {}", i + 1), random_genome(&mut rng), 2, 0, 0)?;
        entrants.push((owner, id));
    }

    let arena = Arc::new(Arena::new(
        config,
        chain.clone() as Arc<dyn ChainClient>,
        Arc::new(MemoryStore::new()),
    )?);

    let now = app::now();
    let mut tasks = Vec::with_capacity(players);
    for (owner, id) in entrants {
        let arena = Arc::clone(&arena);
        tasks.push(tokio::spawn(async move {
            let outcome = arena.find_battle(&owner, id, now).await;
            (owner, outcome)
        }));
    }

    for task in tasks {
        let (owner, outcome) = task.await?;
        let battle_id = match outcome {
            Ok(id) => id,
            Err(e) => {
                println!("{}: no battle ({})", owner, e);
                continue;
            }
        };
        let Some(battle) = arena.battles.battle(battle_id).await else {
            continue;
        };
        println!(
            "{}: {} vs {}{}",
            owner,
            battle.combatant1.display_name(),
            battle.combatant2.display_name(),
            if battle.combatant2.is_synthetic { " (AI)" } else { "" }
        );
        // The ledger cannot resolve a synthetic opponent, so those battles are fled.
        if battle.combatant2.is_synthetic {
            arena.battles.flee(battle_id, app::now()).await?;
            continue;
        }
        match arena.battles.attack(battle_id, app::now()).await {
            Ok(BattleStatus::ResolvedWin) => println!("  victory"),
            Ok(status) => println!("  {}", status),
            Err(e) => println!("  attack failed: {}", e),
        }
    }

    for battle in arena.battles.history().await {
        for line in &battle.log {
            println!("  [{}] {}", &battle.id.to_string()[..8], line);
        }
    }
    arena.metrics().log_summary();
    Ok(())
}
