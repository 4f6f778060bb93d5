use crate::*;

/// Номер нейрона в сети (индекс в общем списке нейронов)
pub type NeuronId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeuronKind {
    Normal,
    /// Смещение: выход всегда 1.0
    Bias,
}

/// Ссылка на входную связь: связью владеет нейрон-источник,
/// slot - её номер в списке выходных связей источника
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRef {
    pub source: NeuronId,
    pub slot: usize,
}

#[derive(Clone, Debug)]
pub struct Neuron {
    kind: NeuronKind,
    role: LayerKind,
    layer: usize,
    output: f64,
    gradient: f64,
    outgoing: Vec<Connection>,
    incoming: Vec<ConnectionRef>,
}

/// Функция активации
pub fn transfer(x: f64) -> f64 {
    x.tanh()
}

/// Производная tanh, выраженная через выход нейрона: 1 - tanh(x)^2
pub fn transfer_derivative(output: f64) -> f64 {
    1.0 - output * output
}

impl Neuron {
    pub fn new(kind: NeuronKind, role: LayerKind, layer: usize) -> Self {
        Self {
            kind,
            role,
            layer,
            output: match kind {
                NeuronKind::Normal => 0.0,
                NeuronKind::Bias => 1.0,
            },
            gradient: 0.0,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    pub fn is_bias(&self) -> bool {
        self.kind == NeuronKind::Bias
    }

    /// Роль слоя, в котором находится нейрон
    pub fn role(&self) -> LayerKind {
        self.role
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn set_output(&mut self, value: f64) {
        assert!(!self.is_bias(), "output of a bias neuron is fixed at 1.0");
        self.output = value;
    }

    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    pub fn outgoing(&self) -> &[Connection] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[ConnectionRef] {
        &self.incoming
    }

    pub fn register_incoming(&mut self, connection: ConnectionRef) {
        self.incoming.push(connection);
    }

    /// Связи от нейрона id ко всем нейронам targets (обычные нейроны следующего слоя)
    pub fn initialize_outgoing(
        neurons: &mut [Neuron],
        id: NeuronId,
        targets: Range<NeuronId>,
        connect: &mut dyn FnMut(NeuronId, NeuronId) -> Connection,
    ) {
        assert!(
            neurons[id].role != LayerKind::Output,
            "neurons of the output layer have no outgoing connections"
        );
        neurons[id].outgoing.reserve(targets.len());
        for target in targets {
            debug_assert!(!neurons[target].is_bias());
            let slot = neurons[id].outgoing.len();
            neurons[id].outgoing.push(connect(id, target));
            neurons[target].register_incoming(ConnectionRef { source: id, slot });
        }
    }

    /// Сумма входов, взвешенных весами входных связей
    pub fn weighted_input(&self, neurons: &[Neuron]) -> f64 {
        self.incoming
            .iter()
            .map(|link| {
                let source = &neurons[link.source];
                source.output * source.outgoing[link.slot].weight()
            })
            .sum()
    }

    /// Расчет выхода нейрона id; входной слой и смещения не трогаем
    pub fn feed_forward(neurons: &mut [Neuron], id: NeuronId) {
        let neuron = &neurons[id];
        if neuron.is_bias() || neuron.role == LayerKind::Input {
            return;
        }
        let sum = neuron.weighted_input(neurons);
        neurons[id].output = transfer(sum);
    }

    pub fn compute_output_gradient(&mut self, target: f64) {
        assert!(
            self.role == LayerKind::Output,
            "output gradient is only defined for neurons of the output layer"
        );
        assert!(!self.is_bias(), "bias neurons have no output gradient");
        let delta = target - self.output;
        self.gradient = delta * transfer_derivative(self.output);
    }

    /// Сумма вкладов нейрона в градиенты следующего слоя
    pub fn downstream_error(&self, neurons: &[Neuron]) -> f64 {
        self.outgoing
            .iter()
            .map(|connection| connection.weight() * neurons[connection.target()].gradient)
            .sum()
    }

    /// Градиент нейрона скрытого слоя.
    /// Градиенты следующего слоя к этому моменту должны быть посчитаны.
    pub fn compute_hidden_gradient(neurons: &mut [Neuron], id: NeuronId) {
        let neuron = &neurons[id];
        assert!(
            neuron.role == LayerKind::Hidden,
            "hidden gradient is only defined for neurons of a hidden layer"
        );
        if neuron.is_bias() {
            return;
        }
        let gradient = neuron.downstream_error(neurons) * transfer_derivative(neuron.output);
        neurons[id].gradient = gradient;
    }

    /// Обновление весов входных связей нейрона id
    pub fn update_weights(neurons: &mut [Neuron], id: NeuronId, eta: f64, alpha: f64) {
        assert!(
            neurons[id].role != LayerKind::Input,
            "neurons of the input layer have no incoming connections to update"
        );
        let gradient = neurons[id].gradient;
        for k in 0..neurons[id].incoming.len() {
            let link = neurons[id].incoming[k];
            let source = &mut neurons[link.source];
            let output = source.output;
            let connection = &mut source.outgoing[link.slot];
            //вход, усиленный градиентом и скоростью обучения + доля прошлого изменения
            let delta = eta * output * gradient + alpha * connection.delta_weight();
            connection.adjust(delta);
        }
    }
}
