//! Command line argument helpers.
extern crate serde_json;
extern crate tune_core;

use std::fs::File;

use clap::{App, Arg, ArgMatches};

use self::tune_core::optimizer::TunerParameters;

/// Trait to add new arguments to the current app
pub trait ArgAugmenter {
    /// Type of struct to output from this parser
    type Output;

    /// Specifies arguments to add
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b>;

    /// Parses the arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output;
}

/// Struct defining the tuning data arguments using ArgAugmenter
pub struct DatasetArgs;

/// Parsed tuning data arguments
pub struct DatasetMeta {
    /// Path to the n-best file
    pub nbest: String,
    /// Optional path to the tokenized source file
    pub source: Option<String>,
    /// Paths to the tokenized reference files
    pub refs: Vec<String>,
    /// Optional initial weights file
    pub weights_in: Option<String>,
    /// Where to write the tuned weights
    pub weights_out: Option<String>,
}

impl ArgAugmenter for DatasetArgs {
    type Output = DatasetMeta;

    /// Specifies arguments for where the tuning data lives
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("nbest")
                .short("n")
                .long("nbest")
                .takes_value(true)
                .required(true)
                .help("N-best file: `id ||| tokens ||| name=value ... ||| score`"),
        )
        .arg(
            Arg::with_name("source")
                .long("source")
                .takes_value(true)
                .help("Tokenized source file, one sentence per line"),
        )
        .arg(
            Arg::with_name("refs")
                .short("r")
                .long("refs")
                .takes_value(true)
                .multiple(true)
                .required(true)
                .help("Tokenized reference files, one sentence per line"),
        )
        .arg(
            Arg::with_name("weights")
                .short("w")
                .long("weights")
                .takes_value(true)
                .help("Initial weights file of `name value` lines"),
        )
        .arg(
            Arg::with_name("out")
                .short("o")
                .long("out")
                .takes_value(true)
                .help("Where to write the tuned weights"),
        )
    }

    /// Parses the tuning data arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> DatasetMeta {
        let refs = args
            .values_of("refs")
            .expect("--refs is required")
            .map(|x| x.to_string())
            .collect();
        DatasetMeta {
            nbest: args
                .value_of("nbest")
                .expect("--nbest is required")
                .to_string(),
            source: args.value_of("source").map(|x| x.to_string()),
            refs: refs,
            weights_in: args.value_of("weights").map(|x| x.to_string()),
            weights_out: args.value_of("out").map(|x| x.to_string()),
        }
    }
}

/// Struct defining the optimizer and loop arguments using ArgAugmenter
pub struct OptimizerArgs;

/// Parsed optimizer and loop arguments
pub struct OptimizerMeta {
    /// Optimizer parameters, config file values overridden by flags
    pub params: TunerParameters,
    /// Number of passes over the tuning set
    pub epochs: usize,
    /// Instances per mini-batch
    pub batch_size: usize,
    /// Sample batch instances on worker threads when the metric allows it
    pub parallel: bool,
    /// Metric name, `bleu` or `pseudo-bleu`
    pub metric: String,
}

impl ArgAugmenter for OptimizerArgs {
    type Output = OptimizerMeta;

    /// Specifies arguments for the optimizer
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("JSON file of tuner parameters; flags override it"),
        )
        .arg(
            Arg::with_name("gamma")
                .short("g")
                .long("gamma")
                .takes_value(true)
                .help("Number of sampled candidate pairs per instance"),
        )
        .arg(
            Arg::with_name("xi")
                .short("x")
                .long("xi")
                .takes_value(true)
                .help("Number of max-margin pairs retained per instance"),
        )
        .arg(
            Arg::with_name("threshold")
                .short("t")
                .long("threshold")
                .takes_value(true)
                .help("Noise threshold on the metric margin"),
        )
        .arg(
            Arg::with_name("min_feature_count")
                .long("min-feature-count")
                .takes_value(true)
                .help("Distinct instances a feature must appear in"),
        )
        .arg(
            Arg::with_name("sigma")
                .long("sigma")
                .takes_value(true)
                .help("Gaussian prior sigma"),
        )
        .arg(
            Arg::with_name("rate")
                .long("rate")
                .takes_value(true)
                .help("Learning rate"),
        )
        .arg(
            Arg::with_name("updater")
                .short("u")
                .long("updater")
                .takes_value(true)
                .help("Update rule: sgd or adagrad"),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .takes_value(true)
                .help("Base sampling seed"),
        )
        .arg(
            Arg::with_name("epochs")
                .short("i")
                .long("epochs")
                .takes_value(true)
                .help("Number of passes over the tuning set"),
        )
        .arg(
            Arg::with_name("batch_size")
                .short("b")
                .long("batch-size")
                .takes_value(true)
                .help("Instances per mini-batch"),
        )
        .arg(
            Arg::with_name("parallel")
                .short("p")
                .long("parallel")
                .help("Sample batch instances on worker threads"),
        )
        .arg(
            Arg::with_name("metric")
                .short("m")
                .long("metric")
                .takes_value(true)
                .help("Metric: bleu or pseudo-bleu"),
        )
    }

    /// Parses the optimizer arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> OptimizerMeta {
        let mut params: TunerParameters = match args.value_of("config") {
            Some(path) => {
                let f = File::open(path).expect(&format!("config `{}` failed to open!", path));
                self::serde_json::from_reader(f).expect("Error parsing tuner config!")
            }
            None => TunerParameters::default(),
        };
        params.gamma = value_t!(args, "gamma", usize).ok().or(params.gamma);
        params.xi = value_t!(args, "xi", usize).ok().or(params.xi);
        params.n_threshold = value_t!(args, "threshold", f64).ok().or(params.n_threshold);
        params.min_feature_segment_count = value_t!(args, "min_feature_count", usize)
            .ok()
            .or(params.min_feature_segment_count);
        params.sigma = value_t!(args, "sigma", f64).ok().or(params.sigma);
        params.rate = value_t!(args, "rate", f64).ok().or(params.rate);
        params.updater = value_t!(args, "updater", String).ok().or(params.updater);
        params.seed = value_t!(args, "seed", u64).ok().or(params.seed);

        OptimizerMeta {
            params: params,
            epochs: value_t!(args, "epochs", usize).unwrap_or(5),
            batch_size: value_t!(args, "batch_size", usize).unwrap_or(1),
            parallel: args.is_present("parallel"),
            metric: value_t!(args, "metric", String).unwrap_or("bleu".into()),
        }
    }
}
