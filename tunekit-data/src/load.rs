//! Load
//! ---
//!
//! This defines the methods to read n-best lists, tokenized sentence files,
//! and weight files.
//!
//! N-best files use one line per candidate:
//!
//! ```text
//! id ||| output tokens ||| name=value name=value ... ||| score
//! ```
//!
//! Consecutive lines with the same id form one list.  Weight files are plain
//! `name value` lines.
use std::fs::File;
use std::io::{BufRead, BufReader, Error, Write};

use crate::datatypes::FeatureVector;
use crate::nbest::{Hypothesis, Tokens};

/// Given a line from an n-best file, outputs the source id and hypothesis
pub fn parse_nbest_line(line: &str) -> Option<(usize, Hypothesis)> {
    let mut pieces = line.split("|||");
    let source_id = pieces.next().and_then(|x| x.trim().parse().ok())?;
    let translation: Tokens = pieces
        .next()?
        .split_whitespace()
        .map(|x| x.to_string())
        .collect();

    let mut features = FeatureVector::new();
    for entry in pieces.next()?.split_whitespace() {
        let mut kv = entry.split('=');
        match (kv.next(), kv.next().and_then(|v| v.parse().ok())) {
            (Some(name), Some(value)) => features.set(name, value),
            _ => return None,
        }
    }

    let score = pieces
        .next()
        .and_then(|x| x.trim().parse().ok())
        .unwrap_or(0.0);
    Some((source_id, Hypothesis::new(translation, features, score)))
}

/// Given a file path, loads the n-best lists grouped by source id.
/// Malformed lines are skipped.
pub fn read_nbest(fname: &str) -> Result<Vec<(usize, Vec<Hypothesis>)>, Error> {
    let f = File::open(fname)?;
    let br = BufReader::new(f);
    let mut lists: Vec<(usize, Vec<Hypothesis>)> = Vec::new();
    for line in br.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some((source_id, hypothesis)) = parse_nbest_line(&line) {
            match lists.last_mut() {
                Some((last_id, hypotheses)) if *last_id == source_id => {
                    hypotheses.push(hypothesis)
                }
                _ => lists.push((source_id, vec![hypothesis])),
            }
        }
    }
    Ok(lists)
}

/// Reads a tokenized file, one sentence per line
pub fn read_tokenized(fname: &str) -> Result<Vec<Tokens>, Error> {
    let f = File::open(fname)?;
    let br = BufReader::new(f);
    let mut sentences = Vec::new();
    for line in br.lines() {
        let line = line?;
        sentences.push(line.split_whitespace().map(|x| x.to_string()).collect());
    }
    Ok(sentences)
}

/// Reads a weight file of `name value` lines
pub fn read_weights(fname: &str) -> Result<FeatureVector, Error> {
    let f = File::open(fname)?;
    let br = BufReader::new(f);
    let mut weights = FeatureVector::new();
    for line in br.lines() {
        let line = line?;
        let mut pieces = line.split_whitespace();
        if let (Some(name), Some(value)) = (pieces.next(), pieces.next()) {
            if let Ok(value) = value.parse() {
                weights.set(name, value);
            }
        }
    }
    Ok(weights)
}

/// Writes a weight file, one `name value` line per feature, sorted by name
pub fn write_weights<W: Write>(weights: &FeatureVector, writer: &mut W) -> Result<(), Error> {
    let mut entries: Vec<(&String, &f64)> = weights.iter().collect();
    entries.sort_by_key(|(name, _v)| *name);
    for (name, value) in entries {
        writeln!(writer, "{} {}", name, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate tempfile;

    use super::*;

    #[test]
    fn test_parse_nbest_line() {
        let line = "3 ||| das ist gut ||| lm=-4.2 tm=1.5 wp=-3 ||| -12.75";
        let (source_id, hyp) = parse_nbest_line(line).unwrap();
        assert_eq!(source_id, 3);
        assert_eq!(hyp.translation, vec!["das", "ist", "gut"]);
        assert_eq!(hyp.features.get("lm"), -4.2);
        assert_eq!(hyp.features.get("tm"), 1.5);
        assert_eq!(hyp.features.get("wp"), -3.0);
        assert_eq!(hyp.score, -12.75);
    }

    #[test]
    fn test_parse_nbest_line_malformed() {
        assert!(parse_nbest_line("not a line").is_none());
        assert!(parse_nbest_line("x ||| tokens ||| lm=1 ||| 0").is_none());
        assert!(parse_nbest_line("0 ||| tokens ||| lm=junk ||| 0").is_none());
    }

    #[test]
    fn test_read_nbest_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbest.txt");
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "0 ||| a b ||| lm=1 ||| 0.5").unwrap();
            writeln!(f, "0 ||| a c ||| lm=2 ||| 0.25").unwrap();
            writeln!(f, "").unwrap();
            writeln!(f, "7 ||| d ||| lm=3 ||| 0.1").unwrap();
        }

        let lists = read_nbest(path.to_str().unwrap()).unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].0, 0);
        assert_eq!(lists[0].1.len(), 2);
        assert_eq!(lists[1].0, 7);
        assert_eq!(lists[1].1.len(), 1);
        assert_eq!(lists[0].1[1].translation, vec!["a", "c"]);
    }

    #[test]
    fn test_weights_round_trip() {
        let mut weights = FeatureVector::new();
        weights.set("tm", 0.5);
        weights.set("lm", -1.25);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.wts");
        {
            let mut f = File::create(&path).unwrap();
            write_weights(&weights, &mut f).unwrap();
        }

        let back = read_weights(path.to_str().unwrap()).unwrap();
        assert_eq!(back.len(), 2);
        assert!(back.approx_eq(&weights, 1e-12));
    }
}
