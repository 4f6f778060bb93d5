use crate::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Hidden,
    Output,
}

/// Слой сети. Нейроны слоя лежат подряд в общем списке нейронов сети:
/// сначала обычные, за ними смещение (у входного и скрытых слоёв).
#[derive(Clone, Debug)]
pub struct Layer {
    kind: LayerKind,
    index: usize,
    first: NeuronId,
    size: usize,
    bias: Option<NeuronId>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Layer {
    /// Создание слоя: нейроны добавляются в конец списка нейронов сети
    pub fn build(neurons: &mut Vec<Neuron>, index: usize, kind: LayerKind, size: usize) -> Self {
        let first = neurons.len();
        neurons.extend((0..size).map(|_| Neuron::new(NeuronKind::Normal, kind, index)));
        let bias = if kind == LayerKind::Output {
            None
        } else {
            neurons.push(Neuron::new(NeuronKind::Bias, kind, index));
            Some(neurons.len() - 1)
        };

        Self {
            kind,
            index,
            first,
            size,
            bias,
            prev: None,
            next: None,
        }
    }

    pub fn link_adjacency(&mut self, prev: Option<usize>, next: Option<usize>) {
        self.prev = prev;
        self.next = next;
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_input(&self) -> bool {
        self.kind == LayerKind::Input
    }

    pub fn is_hidden(&self) -> bool {
        self.kind == LayerKind::Hidden
    }

    pub fn is_output(&self) -> bool {
        self.kind == LayerKind::Output
    }

    /// Количество нейронов без смещения
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bias(&self) -> Option<NeuronId> {
        self.bias
    }

    /// Номера обычных нейронов слоя
    pub fn normal(&self) -> Range<NeuronId> {
        self.first..self.first + self.size
    }

    /// Номера всех нейронов слоя, включая смещение
    pub fn all(&self) -> Range<NeuronId> {
        let end = self.bias.map_or(self.first + self.size, |bias| bias + 1);
        self.first..end
    }

    pub fn prev(&self) -> usize {
        assert!(!self.is_input(), "the input layer has no previous layer");
        self.prev.expect("layer adjacency is not linked")
    }

    pub fn next(&self) -> usize {
        assert!(!self.is_output(), "the output layer has no next layer");
        self.next.expect("layer adjacency is not linked")
    }

    /// Связи всех нейронов слоя (и смещения) с обычными нейронами следующего слоя
    pub fn initialize_connections(
        &self,
        layers: &[Layer],
        neurons: &mut [Neuron],
        connect: &mut dyn FnMut(NeuronId, NeuronId) -> Connection,
    ) {
        if self.is_output() {
            return;
        }
        let targets = layers[self.next()].normal();
        for id in self.all() {
            Neuron::initialize_outgoing(neurons, id, targets.clone(), connect);
        }
    }

    pub fn feed_forward(&self, neurons: &mut [Neuron]) {
        if self.is_input() {
            return;
        }
        for id in self.all() {
            Neuron::feed_forward(neurons, id);
        }
    }
}
