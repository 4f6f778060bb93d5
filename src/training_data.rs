use crate::*;
use std::{fs, path::Path, str::FromStr};

/// Один обучающий пример: входы и ожидаемые выходы
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingPass {
    pub inputs: Vec<f64>,
    pub expected: Vec<f64>,
}

impl TrainingPass {
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    pub fn expected(&self) -> &[f64] {
        &self.expected
    }
}

/// Обучающая выборка.
///
/// Формат файла (пустые строки пропускаются):
///
/// ```text
/// topology 2 4 1
///
/// input    1.0 0.0
/// expected 1.0
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingData {
    topology: Vec<LayerTopology>,
    passes: Vec<TrainingPass>,
}

impl TrainingData {
    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, TrainingDataError> {
        fs::read_to_string(path)?.parse()
    }

    pub fn parse(text: &str) -> std::result::Result<Self, TrainingDataError> {
        //(номер строки, строка) без пустых строк
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (line, topology) = lines.next().ok_or(TrainingDataError::MissingTopology)?;
        let topology: Vec<LayerTopology> = values::<usize>(line, topology, "topology")?
            .into_iter()
            .map(LayerTopology::from)
            .collect();
        if topology.len() < 2 {
            return Err(TrainingDataError::TooFewLayers {
                layers: topology.len(),
            });
        }
        let input_size = topology[0].neurons;
        let output_size = topology[topology.len() - 1].neurons;

        let mut passes = Vec::new();
        while let Some((line, text)) = lines.next() {
            let inputs = values::<f64>(line, text, "input")?;
            check_size(line, input_size, inputs.len())?;

            let (line, text) = lines
                .next()
                .ok_or(TrainingDataError::MissingExpected { line })?;
            let expected = values::<f64>(line, text, "expected")?;
            check_size(line, output_size, expected.len())?;

            passes.push(TrainingPass { inputs, expected });
        }

        Ok(Self { topology, passes })
    }

    pub fn topology(&self) -> &[LayerTopology] {
        &self.topology
    }

    pub fn passes(&self) -> &[TrainingPass] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl FromStr for TrainingData {
    type Err = TrainingDataError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl<'a> IntoIterator for &'a TrainingData {
    type Item = &'a TrainingPass;
    type IntoIter = std::slice::Iter<'a, TrainingPass>;

    fn into_iter(self) -> Self::IntoIter {
        self.passes.iter()
    }
}

/// Значения строки вида "keyword v1 v2 ..."
fn values<T: FromStr>(
    line: usize,
    text: &str,
    keyword: &'static str,
) -> std::result::Result<Vec<T>, TrainingDataError> {
    let mut parts = text.split_whitespace();
    let found = parts.next().unwrap_or_default();
    if found != keyword {
        return Err(TrainingDataError::UnexpectedKeyword {
            line,
            expected: keyword,
            found: found.to_string(),
        });
    }
    parts
        .map(|value| {
            value.parse().map_err(|_| TrainingDataError::InvalidNumber {
                line,
                value: value.to_string(),
            })
        })
        .collect()
}

fn check_size(
    line: usize,
    expected: usize,
    actual: usize,
) -> std::result::Result<(), TrainingDataError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TrainingDataError::SizeMismatch {
            line,
            expected,
            actual,
        })
    }
}
