use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ndarray_rand::rand::thread_rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use elman::dataset::{encode, load_samples, split_per_class};
use elman::evaluate::evaluate;
use elman::persist::{infer_dimensions, load_text, save_snapshot, save_text};
use elman::{RecurrentNeuralNetwork, TrainingConfig};

#[derive(Parser)]
#[command(name = "elman", version, about = "Elman RNN sequence classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on labelled token-ID samples and report test-set ranks
    Train(TrainArgs),
    /// Evaluate text weights on labelled samples
    Evaluate {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        weights: PathBuf,
    },
    /// Predict the class of one token-ID sequence
    Predict {
        #[arg(long)]
        weights: PathBuf,
        /// Token ids, in sequence order
        #[arg(long, num_args = 1.., required = true)]
        tokens: Vec<usize>,
        /// Expected class, shown next to the prediction
        #[arg(long)]
        label: Option<usize>,
    },
    /// Print the dimensions stored in a text weight file
    Info {
        #[arg(long)]
        weights: PathBuf,
    },
}

#[derive(Args)]
struct TrainArgs {
    /// Samples, one `label<TAB>ids` per line
    #[arg(long)]
    data: PathBuf,
    /// Continue from these text weights instead of a fresh initialization
    #[arg(long)]
    weights_in: Option<PathBuf>,
    #[arg(long, default_value = "weights.txt")]
    weights_out: PathBuf,
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
    /// Share of the samples, spread evenly over classes, used for training
    #[arg(long, default_value_t = 0.5)]
    train_fraction: f64,
    #[arg(long)]
    input_dimensions: Option<usize>,
    #[arg(long)]
    hidden_dimensions: Option<usize>,
    #[arg(long)]
    output_dimensions: Option<usize>,
    #[arg(long)]
    learning_rate: Option<f64>,
    #[arg(long)]
    epochs: Option<usize>,
    /// 0 = untruncated
    #[arg(long)]
    truncate_steps: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainArgs {
    fn config(&self) -> elman::Result<TrainingConfig> {
        let mut config = TrainingConfig::from_env()?;
        if let Some(v) = self.input_dimensions {
            config.input_dimensions = v;
        }
        if let Some(v) = self.hidden_dimensions {
            config.hidden_dimensions = v;
        }
        if let Some(v) = self.output_dimensions {
            config.output_dimensions = v;
        }
        if let Some(v) = self.learning_rate {
            config.learning_rate = v;
        }
        if let Some(v) = self.epochs {
            config.epochs = v;
        }
        if let Some(v) = self.truncate_steps {
            config.truncate_steps = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("elman=info".parse()?))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => train(&args),
        Command::Evaluate { data, weights } => {
            let network = load_text(&weights)?;
            let samples = load_samples(&data)?;
            let evaluation = evaluate(&network, &samples)?;
            println!("{evaluation}");
            println!("Accuracy: {:.4}", evaluation.accuracy());
            Ok(())
        }
        Command::Predict { weights, tokens, label } => {
            let network = load_text(&weights)?;
            match network.predict_tokens(&tokens)? {
                Some(class) => println!("Predicted: {class}"),
                None => println!("Predicted: none"),
            }
            if let Some(label) = label {
                println!("Expected: {label}");
            }
            Ok(())
        }
        Command::Info { weights } => {
            let text = std::fs::read_to_string(&weights)?;
            let (input, hidden, output) = infer_dimensions(&text)?;
            println!("input: {input}, hidden: {hidden}, output: {output}");
            Ok(())
        }
    }
}

fn train(args: &TrainArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config()?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(thread_rng())?,
    };

    let mut network = match &args.weights_in {
        Some(path) => load_text(path)?,
        None => RecurrentNeuralNetwork::with_rng(
            config.input_dimensions,
            config.hidden_dimensions,
            config.output_dimensions,
            &mut rng,
        )?,
    };
    let (input_dimensions, hidden_dimensions, output_dimensions) = network.dimensions();

    let samples = load_samples(&args.data)?;
    let (train_set, test_set) = split_per_class(&samples, output_dimensions, args.train_fraction, &mut rng)?;
    info!(
        train = train_set.len(),
        test = test_set.len(),
        input_dimensions,
        hidden_dimensions,
        output_dimensions,
        "dataset split"
    );

    let (inputs, expected) = encode(&train_set, input_dimensions, output_dimensions)?;
    let report = network.train(
        &inputs,
        &expected,
        config.learning_rate,
        config.epochs,
        config.truncate_steps,
    )?;
    if let Some(loss) = report.final_loss() {
        println!("Final loss: {loss:.6}");
    }

    let evaluation = evaluate(&network, &test_set)?;
    println!("{evaluation}");
    println!("Accuracy: {:.4}", evaluation.accuracy());

    save_text(&args.weights_out, &network)?;
    if let Some(path) = &args.snapshot_out {
        save_snapshot(path, &network)?;
    }
    Ok(())
}
