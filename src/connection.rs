use crate::*;

/// Связь между нейронами соседних слоёв (source -> target)
#[derive(Clone, Debug)]
pub struct Connection {
    weight: f64,
    /// Последнее изменение веса (для момента)
    delta_weight: f64,
    source: NeuronId,
    target: NeuronId,
}

impl Connection {
    pub fn new(source: NeuronId, target: NeuronId, weight: f64) -> Self {
        Self {
            weight,
            delta_weight: 0.0,
            source,
            target,
        }
    }

    /// Связь со случайным весом из [0.0 .. 1.0)
    pub fn random(source: NeuronId, target: NeuronId, rng: &mut dyn RngCore) -> Self {
        Self::new(source, target, rng.gen_range(0.0..1.0))
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Замена веса; последнее изменение не трогаем
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn delta_weight(&self) -> f64 {
        self.delta_weight
    }

    /// Изменение веса на delta с запоминанием delta для момента
    pub fn adjust(&mut self, delta: f64) {
        self.weight += delta;
        self.delta_weight = delta;
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }
}
