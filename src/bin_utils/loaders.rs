//! Dataset loading helpers for binaries.
extern crate tune_data;

use std::fs::File;

use self::tune_data::datatypes::FeatureVector;
use self::tune_data::load::{read_nbest, read_tokenized, read_weights, write_weights};
use self::tune_data::nbest::{Tokens, TuningInstance};

/// Reads n-best lists, sources, and references and assembles the tuning set.
/// Instance counts across the files must line up.
pub fn build_tune_set(
    nbest_path: &str,
    source_path: Option<&str>,
    ref_paths: &[String],
) -> Vec<TuningInstance> {
    println!("Loading n-best lists at {}", nbest_path);
    let lists =
        read_nbest(nbest_path).expect(&format!("Error reading n-best file: {}", nbest_path));
    println!("Tuning instances: {}", lists.len());
    println!(
        "Candidates: {}",
        lists.iter().map(|(_id, hyps)| hyps.len()).sum::<usize>()
    );

    assert!(!ref_paths.is_empty(), "At least one reference file is required");
    let mut references: Vec<Vec<Tokens>> = vec![Vec::new(); lists.len()];
    for path in ref_paths.iter() {
        let sentences =
            read_tokenized(path).expect(&format!("Error reading reference file: {}", path));
        assert_eq!(
            sentences.len(),
            lists.len(),
            "Reference count mismatch in {}",
            path
        );
        for (i, sentence) in sentences.into_iter().enumerate() {
            references[i].push(sentence);
        }
    }

    let sources: Vec<Tokens> = match source_path {
        Some(path) => {
            let sentences =
                read_tokenized(path).expect(&format!("Error reading source file: {}", path));
            assert_eq!(
                sentences.len(),
                lists.len(),
                "Source count mismatch in {}",
                path
            );
            sentences
        }
        None => vec![Vec::new(); lists.len()],
    };

    lists
        .into_iter()
        .zip(sources.into_iter())
        .zip(references.into_iter())
        .map(|(((source_id, hypotheses), source), references)| TuningInstance {
            source_id: source_id,
            source: source,
            hypotheses: hypotheses,
            references: references,
        })
        .collect()
}

/// Loads initial weights if a path was given, empty weights otherwise
pub fn load_weights(path: Option<&str>) -> FeatureVector {
    match path {
        Some(fname) => {
            println!("Loading initial weights at {}", fname);
            read_weights(fname).expect(&format!("Error reading weights file: {}", fname))
        }
        None => FeatureVector::new(),
    }
}

/// Writes out the tuned weights if asked
pub fn dump_weights(weights: &FeatureVector, path: Option<&str>) -> () {
    match path {
        Some(fname) => {
            println!("Writing weights to {}", fname);
            let mut f = File::create(fname).expect(&format!("file `{}` failed to open!", fname));
            write_weights(weights, &mut f).expect("Error writing weights!")
        }
        _ => (),
    }
}
