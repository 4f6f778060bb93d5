use crate::*;

/// Топология слоя
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerTopology {
    /// Количество нейронов в слое (без нейрона смещения)
    pub neurons: usize,
}

impl From<usize> for LayerTopology {
    fn from(neurons: usize) -> Self {
        Self { neurons }
    }
}

impl LayerTopology {
    /// Топология сети из списка размеров слоёв
    pub fn chain(sizes: &[usize]) -> Vec<LayerTopology> {
        sizes.iter().copied().map(LayerTopology::from).collect()
    }

    /// Количество связей сети с такой топологией:
    /// каждый нейрон слоя (и его смещение) связан с каждым нейроном следующего
    pub fn connection_count(layers: &[LayerTopology]) -> usize {
        layers
            .iter()
            .tuple_windows()
            .map(|(from, to)| (from.neurons + 1) * to.neurons)
            .sum()
    }
}
