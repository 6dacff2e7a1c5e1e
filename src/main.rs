use clap::{Parser, Subcommand};
use log::{debug, info};
use restr::{GenerationProfile, GeneratorConfig, MarkovGenerator, PatternGenerator, PatternNode};
use std::fs;
use std::path::PathBuf;

/// Random strings from regular expressions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pattern to generate strings for
    #[arg(help = "Regular expression to generate matching strings for")]
    pattern: Option<String>,

    /// Number of strings to generate
    #[arg(help = "Number of strings to generate", default_value = "1")]
    count: Option<usize>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Ceiling for unbounded repetitions
    #[arg(long)]
    max_repeat: Option<usize>,

    /// JSON profile with configuration and capture bindings
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Verify every generated string against the pattern
    #[arg(long)]
    check: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed tree of a pattern
    Explain {
        #[arg(help = "Regular expression to explain")]
        pattern: String,
    },

    /// Generate text from a Markov chain trained on files
    Markov {
        /// Window width, at least 2
        #[arg(long, default_value = "3")]
        depth: usize,

        /// Characters stripped from the training texts
        #[arg(long, default_value = "")]
        exclude: String,

        /// Minimum length of each sample
        #[arg(long, default_value = "80")]
        length: usize,

        /// Number of samples
        #[arg(long, default_value = "1")]
        count: usize,

        /// How many times each training text is repeated
        #[arg(long, default_value = "1")]
        multiplier: usize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(help = "Training text files", required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Commands::Explain { pattern } => {
                print!("{}", PatternNode::parse(&pattern)?);
            }
            Commands::Markov {
                depth,
                exclude,
                length,
                count,
                multiplier,
                seed,
                files,
            } => {
                let mut markov = match seed {
                    Some(seed) => MarkovGenerator::with_seed(depth, exclude.chars(), seed)?,
                    None => MarkovGenerator::new(depth, exclude.chars())?,
                };
                for file in &files {
                    let text = fs::read_to_string(file)?;
                    markov.train_on(&file.display().to_string(), &text, multiplier)?;
                }
                info!(
                    "Trained on {} files, {} windows",
                    files.len(),
                    markov.model().window_count()
                );

                for _ in 0..count {
                    println!("{}", markov.sample(length)?);
                }
            }
        }
        return Ok(());
    }

    let pattern = cli.pattern.ok_or("Pattern required")?;
    let count = cli.count.unwrap_or(1);

    let mut generator = match &cli.profile {
        Some(path) => {
            info!("Loading profile from {}...", path.display());
            let mut profile = GenerationProfile::from_json_file(path)?;
            if cli.seed.is_some() {
                profile.seed = cli.seed;
            }
            profile.build_relative_to(path.parent())?
        }
        None => match cli.seed {
            Some(seed) => PatternGenerator::with_seed(seed),
            None => PatternGenerator::new(),
        },
    };

    if let Some(max_repeat) = cli.max_repeat {
        generator.set_config(GeneratorConfig { max_repeat });
    }
    debug!("Capture bindings: {:?}", generator.registry().names());

    let tree = PatternNode::parse(&pattern)?;
    for _ in 0..count {
        let generated = generator.generate_from(&tree)?;
        if cli.check && !restr::full_match(&pattern, &generated)? {
            return Err(format!("Generated {:?} does not match {}", generated, pattern).into());
        }
        println!("{}", generated);
    }

    Ok(())
}
