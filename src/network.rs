use crate::*;
use tracing::{debug, trace};

/// Сеть прямого распространения с обучением обратным распространением ошибки
#[derive(Clone, Debug)]
pub struct Network {
    config: TrainingConfig,
    layers: Vec<Layer>,
    /// Все нейроны сети, послойно
    neurons: Vec<Neuron>,
    /// Среднеквадратичная ошибка последнего обратного прохода
    last_error: f64,
    recent_average_error: f64,
}

impl Network {
    /// Создание сети со случайными весами и указанной топологией
    pub fn random(
        rng: &mut dyn RngCore,
        config: TrainingConfig,
        layers: &[LayerTopology],
    ) -> Result<Self> {
        Self::validate(&config, layers)?;
        Ok(Self::build(config, layers, &mut |source, target| {
            Connection::random(source, target, rng)
        }))
    }

    /// Создание сети из весов связей.
    /// Порядок весов: по нейронам-источникам (слой за слоем, смещение последним),
    /// внутри источника - по нейронам следующего слоя.
    pub fn from_weights(
        config: TrainingConfig,
        layers: &[LayerTopology],
        weights: impl IntoIterator<Item = f64>,
    ) -> Result<Self> {
        Self::validate(&config, layers)?;
        let weights: Vec<f64> = weights.into_iter().collect();
        let expected = LayerTopology::connection_count(layers);
        if weights.len() != expected {
            return Err(NetworkError::WeightCount {
                expected,
                actual: weights.len(),
            });
        }
        let mut weights = weights.into_iter();
        Ok(Self::build(config, layers, &mut |source, target| {
            Connection::new(source, target, weights.next().unwrap_or_default())
        }))
    }

    /// Проверка параметров и топологии до создания сети
    fn validate(config: &TrainingConfig, layers: &[LayerTopology]) -> Result<()> {
        config.validate()?;
        if layers.len() < 2 {
            return Err(NetworkError::TooFewLayers {
                layers: layers.len(),
            });
        }
        if let Some(layer) = layers.iter().position(|layer| layer.neurons == 0) {
            return Err(NetworkError::EmptyLayer { layer });
        }
        Ok(())
    }

    fn build(
        config: TrainingConfig,
        layers: &[LayerTopology],
        connect: &mut dyn FnMut(NeuronId, NeuronId) -> Connection,
    ) -> Self {
        let mut neurons = Vec::new();
        let last = layers.len() - 1;
        let mut built: Vec<Layer> = layers
            .iter()
            .enumerate()
            .map(|(index, topology)| {
                let kind = match index {
                    0 => LayerKind::Input,
                    i if i == last => LayerKind::Output,
                    _ => LayerKind::Hidden,
                };
                Layer::build(&mut neurons, index, kind, topology.neurons)
            })
            .collect();

        //смежность слоёв
        for (index, layer) in built.iter_mut().enumerate() {
            let prev = index.checked_sub(1);
            let next = Some(index + 1).filter(|&next| next <= last);
            layer.link_adjacency(prev, next);
        }

        //связи: каждый нейрон слоя со всеми нейронами следующего
        for layer in &built {
            layer.initialize_connections(&built, &mut neurons, connect);
        }

        let network = Self {
            config,
            layers: built,
            neurons,
            last_error: 0.0,
            recent_average_error: 0.0,
        };
        debug!(
            layers = network.layers.len(),
            neurons = network.neurons.len(),
            connections = network.connection_count(),
            "network built"
        );
        network
    }

    /// Расчет в прямом направлении
    pub fn feed_forward(&mut self, inputs: &[f64]) -> Result<()> {
        let expected = self.input_size();
        if inputs.len() != expected {
            return Err(NetworkError::InputSize {
                expected,
                actual: inputs.len(),
            });
        }
        self.set_input(inputs);
        for layer in &self.layers {
            layer.feed_forward(&mut self.neurons);
        }
        Ok(())
    }

    /// Обратное распространение ошибки и обновление весов.
    /// Выходы сети должны быть посчитаны feed_forward.
    pub fn back_propagate(&mut self, targets: &[f64]) -> Result<()> {
        let expected = self.output_size();
        if targets.len() != expected {
            return Err(NetworkError::TargetSize {
                expected,
                actual: targets.len(),
            });
        }
        self.calculate_overall_error(targets);
        self.calculate_average_error();
        self.calculate_output_gradients(targets);
        self.calculate_hidden_gradients();
        self.update_connection_weights();
        trace!(
            error = self.last_error,
            average = self.recent_average_error,
            "back propagation pass"
        );
        Ok(())
    }

    /// Один шаг обучения на примере; возвращает ошибку этого примера
    pub fn train(&mut self, inputs: &[f64], targets: &[f64]) -> Result<f64> {
        if targets.len() != self.output_size() {
            return Err(NetworkError::TargetSize {
                expected: self.output_size(),
                actual: targets.len(),
            });
        }
        self.feed_forward(inputs)?;
        self.back_propagate(targets)?;
        Ok(self.last_error)
    }

    /// Выходы нейронов выходного слоя
    pub fn results(&self) -> Vec<f64> {
        self.layer_neurons(self.output_layer())
            .iter()
            .map(Neuron::output)
            .collect()
    }

    pub fn recent_average_error(&self) -> f64 {
        self.recent_average_error
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Нейроны слоя, включая смещение
    pub fn layer_neurons(&self, layer: &Layer) -> &[Neuron] {
        &self.neurons[layer.all()]
    }

    pub fn input_size(&self) -> usize {
        self.input_layer().size()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer().size()
    }

    pub fn connection_count(&self) -> usize {
        self.neurons.iter().map(|neuron| neuron.outgoing().len()).sum()
    }

    /// Веса всех связей в том же порядке, что принимает from_weights
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.neurons
            .iter()
            .flat_map(|neuron| neuron.outgoing().iter().map(Connection::weight))
    }

    fn input_layer(&self) -> &Layer {
        &self.layers[0]
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    fn set_input(&mut self, inputs: &[f64]) {
        let ids = self.input_layer().normal();
        for (id, &value) in ids.zip_eq(inputs) {
            self.neurons[id].set_output(value);
        }
    }

    fn calculate_overall_error(&mut self, targets: &[f64]) {
        let outputs = &self.neurons[self.output_layer().normal()];
        let sum: f64 = outputs
            .iter()
            .zip_eq(targets)
            .map(|(neuron, target)| {
                let delta = target - neuron.output();
                delta * delta
            })
            .sum();
        self.last_error = (sum / outputs.len() as f64).sqrt();
    }

    fn calculate_average_error(&mut self) {
        let smoothing = self.config.error_smoothing;
        self.recent_average_error =
            (self.recent_average_error * smoothing + self.last_error) / (smoothing + 1.0);
    }

    fn calculate_output_gradients(&mut self, targets: &[f64]) {
        let ids = self.output_layer().normal();
        for (id, &target) in ids.zip_eq(targets) {
            self.neurons[id].compute_output_gradient(target);
        }
    }

    /// От слоя, ближайшего к выходному, к входному
    fn calculate_hidden_gradients(&mut self) {
        for layer in self.layers.iter().rev().filter(|layer| layer.is_hidden()) {
            for id in layer.all() {
                Neuron::compute_hidden_gradient(&mut self.neurons, id);
            }
        }
    }

    fn update_connection_weights(&mut self) {
        let TrainingConfig { eta, alpha, .. } = self.config;
        for layer in self.layers.iter().rev().filter(|layer| !layer.is_input()) {
            for id in layer.all() {
                Neuron::update_weights(&mut self.neurons, id, eta, alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random(sizes: &[usize], config: TrainingConfig) -> Network {
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        Network::random(&mut rng, config, &LayerTopology::chain(sizes)).unwrap()
    }

    #[test]
    fn topology() {
        let network = random(&[3, 5, 4, 2], TrainingConfig::default());
        let layers = network.layers();

        assert_eq!(layers.len(), 4);
        let sizes: Vec<usize> = layers.iter().map(Layer::size).collect();
        assert_eq!(sizes, vec![3, 5, 4, 2]);
        let kinds: Vec<LayerKind> = layers.iter().map(Layer::kind).collect();
        assert_eq!(
            kinds,
            vec![LayerKind::Input, LayerKind::Hidden, LayerKind::Hidden, LayerKind::Output]
        );

        //смещение у всех слоёв, кроме выходного
        for layer in &layers[..3] {
            let neurons = network.layer_neurons(layer);
            assert_eq!(neurons.len(), layer.size() + 1);
            assert!(neurons.last().unwrap().is_bias());
        }
        assert_eq!(network.layer_neurons(&layers[3]).len(), 2);

        assert_eq!(network.connection_count(), 4 * 5 + 6 * 4 + 5 * 2);
        assert_eq!(network.input_size(), 3);
        assert_eq!(network.output_size(), 2);
        assert!(network.weights().all(|w| (0.0..1.0).contains(&w)));
    }

    #[test]
    fn construction_errors() {
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        let config = TrainingConfig::default();

        assert_eq!(
            Network::random(&mut rng, config, &LayerTopology::chain(&[3])).unwrap_err(),
            NetworkError::TooFewLayers { layers: 1 }
        );
        assert_eq!(
            Network::random(&mut rng, config, &[]).unwrap_err(),
            NetworkError::TooFewLayers { layers: 0 }
        );
        assert_eq!(
            Network::random(&mut rng, config, &LayerTopology::chain(&[2, 0, 1])).unwrap_err(),
            NetworkError::EmptyLayer { layer: 1 }
        );
        assert_eq!(
            Network::random(&mut rng, config, &LayerTopology::chain(&[2, 0])).unwrap_err(),
            NetworkError::EmptyLayer { layer: 1 }
        );
        assert_eq!(
            Network::from_weights(config, &LayerTopology::chain(&[2, 1]), [0.1, 0.2])
                .unwrap_err(),
            NetworkError::WeightCount {
                expected: 3,
                actual: 2
            }
        );
        let config = TrainingConfig {
            eta: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            Network::random(&mut rng, config, &LayerTopology::chain(&[2, 1])),
            Err(NetworkError::InvalidConfig { parameter: "eta", .. })
        ));

        //from_weights проверяет параметры и топологию раньше количества весов
        assert!(matches!(
            Network::from_weights(config, &LayerTopology::chain(&[2, 1]), []),
            Err(NetworkError::InvalidConfig { parameter: "eta", .. })
        ));
        let config = TrainingConfig::default();
        assert_eq!(
            Network::from_weights(config, &LayerTopology::chain(&[3]), []).unwrap_err(),
            NetworkError::TooFewLayers { layers: 1 }
        );
        assert_eq!(
            Network::from_weights(config, &LayerTopology::chain(&[2, 0, 1]), [0.5]).unwrap_err(),
            NetworkError::EmptyLayer { layer: 1 }
        );
    }

    #[test]
    fn from_weights() {
        let weights = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let network = Network::from_weights(
            TrainingConfig::default(),
            &LayerTopology::chain(&[2, 2, 1]),
            weights.clone(),
        )
        .unwrap();

        let actual: Vec<f64> = network.weights().collect();
        assert_relative_eq!(actual.as_slice(), weights.as_slice());

        //вход 0 -> скрытые 3, 4 ; вход 1 -> 3, 4 ; смещение 2 -> 3, 4
        let hidden = &network.layers()[1];
        let neurons = network.layer_neurons(hidden);
        let incoming = neurons[0].incoming();
        assert_eq!(incoming.len(), 3);
        assert_eq!(incoming[0], ConnectionRef { source: 0, slot: 0 });
        assert_eq!(incoming[2], ConnectionRef { source: 2, slot: 0 });
    }

    #[test]
    fn propagate() {
        //два входа, один выход, смещение с весом 0
        let mut network = Network::from_weights(
            TrainingConfig::default(),
            &LayerTopology::chain(&[2, 1]),
            [0.5, -0.5, 0.0],
        )
        .unwrap();
        network.feed_forward(&[1.0, 0.0]).unwrap();

        let actual = network.results();
        assert_eq!(actual.len(), 1);
        assert_relative_eq!(actual[0], 0.5f64.tanh());
        assert_relative_eq!(actual[0], 0.4621, epsilon = 1e-4);
    }

    #[test]
    fn propagate_hidden() {
        //вход -> скрытый -> выход, по одному нейрону
        let weights = [0.5, 0.1, -0.4, 0.2];
        let mut network = Network::from_weights(
            TrainingConfig::default(),
            &LayerTopology::chain(&[1, 1, 1]),
            weights,
        )
        .unwrap();
        network.feed_forward(&[0.8]).unwrap();

        let hidden = (0.8f64 * 0.5 + 1.0 * 0.1).tanh();
        let expected = (hidden * -0.4 + 1.0 * 0.2).tanh();
        assert_relative_eq!(network.results()[0], expected);

        //смещения остаются 1.0
        for layer in network.layers() {
            if let Some(bias) = layer.bias() {
                assert_eq!(network.neurons[bias].output(), 1.0);
            }
        }
    }

    #[test]
    fn feed_forward_is_deterministic() {
        let mut network = random(&[3, 4, 2], TrainingConfig::default());
        network.feed_forward(&[0.1, -0.7, 0.3]).unwrap();
        let first = network.results();
        network.feed_forward(&[0.9, 0.9, 0.9]).unwrap();
        network.feed_forward(&[0.1, -0.7, 0.3]).unwrap();
        assert_eq!(network.results(), first);

        //тот же seed - та же сеть
        let mut other = random(&[3, 4, 2], TrainingConfig::default());
        other.feed_forward(&[0.1, -0.7, 0.3]).unwrap();
        assert_eq!(other.results(), first);
    }

    #[test]
    fn wrong_sizes() {
        let mut network = random(&[2, 3, 1], TrainingConfig::default());
        let weights: Vec<f64> = network.weights().collect();

        assert_eq!(
            network.feed_forward(&[1.0]).unwrap_err(),
            NetworkError::InputSize {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(
            network.feed_forward(&[1.0, 0.0, 1.0]).unwrap_err(),
            NetworkError::InputSize {
                expected: 2,
                actual: 3
            }
        );

        network.feed_forward(&[1.0, 0.0]).unwrap();
        let results = network.results();
        assert_eq!(
            network.back_propagate(&[1.0, 0.0]).unwrap_err(),
            NetworkError::TargetSize {
                expected: 1,
                actual: 2
            }
        );
        assert!(network.train(&[1.0, 0.0], &[]).is_err());

        //ничего не изменилось
        assert_eq!(network.results(), results);
        assert_eq!(network.weights().collect::<Vec<_>>(), weights);
        assert_eq!(network.last_error(), 0.0);
    }

    #[test]
    fn zero_error() {
        let mut network = random(&[2, 3, 2], TrainingConfig::default());
        let weights: Vec<f64> = network.weights().collect();

        network.feed_forward(&[0.3, -0.2]).unwrap();
        let targets = network.results();
        network.back_propagate(&targets).unwrap();

        assert_eq!(network.last_error(), 0.0);
        assert_eq!(network.recent_average_error(), 0.0);
        assert_eq!(network.weights().collect::<Vec<_>>(), weights);
    }

    #[test]
    fn rms_error() {
        let config = TrainingConfig {
            error_smoothing: 1.0,
            ..Default::default()
        };
        let mut network = random(&[2, 2], config);
        network.feed_forward(&[0.5, 0.5]).unwrap();
        let out = network.results();
        let targets = [out[0] + 0.3, out[1] - 0.4];
        network.back_propagate(&targets).unwrap();

        //sqrt((0.09 + 0.16) / 2)
        assert_relative_eq!(network.last_error(), (0.125f64).sqrt(), epsilon = 1e-12);
        //(0 * 1 + e) / 2
        assert_relative_eq!(
            network.recent_average_error(),
            (0.125f64).sqrt() / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn back_propagate_hidden() {
        let config = TrainingConfig {
            eta: 0.2,
            alpha: 0.0,
            error_smoothing: 0.0,
        };
        let weights = [0.5, 0.1, -0.4, 0.2];
        let mut network =
            Network::from_weights(config, &LayerTopology::chain(&[1, 1, 1]), weights).unwrap();
        network.feed_forward(&[0.8]).unwrap();
        network.back_propagate(&[0.6]).unwrap();

        let hidden = (0.8f64 * 0.5 + 0.1).tanh();
        let out = (hidden * -0.4 + 0.2).tanh();
        let out_gradient = (0.6 - out) * (1.0 - out * out);
        //градиент скрытого считается по старому весу -0.4
        let hidden_gradient = -0.4 * out_gradient * (1.0 - hidden * hidden);

        let expected = [
            0.5 + 0.2 * 0.8 * hidden_gradient,
            0.1 + 0.2 * 1.0 * hidden_gradient,
            -0.4 + 0.2 * hidden * out_gradient,
            0.2 + 0.2 * 1.0 * out_gradient,
        ];
        let actual: Vec<f64> = network.weights().collect();
        assert_relative_eq!(actual.as_slice(), expected.as_slice(), epsilon = 1e-12);
        assert_relative_eq!(network.last_error(), (0.6 - out).abs(), epsilon = 1e-12);
    }

    #[test]
    fn back_propagate_two_hidden_layers() {
        let config = TrainingConfig {
            eta: 0.2,
            alpha: 0.0,
            error_smoothing: 0.0,
        };
        //вход -> скрытый 1 -> скрытый 2 -> выход, по одному нейрону
        let weights = [0.5, 0.1, -0.4, 0.2, 0.7, -0.3];
        let mut network =
            Network::from_weights(config, &LayerTopology::chain(&[1, 1, 1, 1]), weights).unwrap();
        network.feed_forward(&[0.8]).unwrap();
        network.back_propagate(&[0.6]).unwrap();

        let h1 = (0.8f64 * 0.5 + 0.1).tanh();
        let h2 = (h1 * -0.4 + 0.2).tanh();
        let out = (h2 * 0.7 - 0.3).tanh();
        let out_gradient = (0.6 - out) * (1.0 - out * out);
        let h2_gradient = 0.7 * out_gradient * (1.0 - h2 * h2);
        //первый скрытый слой берёт уже посчитанный градиент второго
        let h1_gradient = -0.4 * h2_gradient * (1.0 - h1 * h1);

        let layers = network.layers();
        assert_relative_eq!(network.layer_neurons(&layers[3])[0].gradient(), out_gradient);
        assert_relative_eq!(network.layer_neurons(&layers[2])[0].gradient(), h2_gradient);
        assert_relative_eq!(network.layer_neurons(&layers[1])[0].gradient(), h1_gradient);
        assert!(h1_gradient != 0.0);

        let expected = [
            0.5 + 0.2 * 0.8 * h1_gradient,
            0.1 + 0.2 * 1.0 * h1_gradient,
            -0.4 + 0.2 * h1 * h2_gradient,
            0.2 + 0.2 * 1.0 * h2_gradient,
            0.7 + 0.2 * h2 * out_gradient,
            -0.3 + 0.2 * 1.0 * out_gradient,
        ];
        let actual: Vec<f64> = network.weights().collect();
        assert_relative_eq!(actual.as_slice(), expected.as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn bias_neurons_after_training() {
        let mut network = random(&[2, 3, 3, 1], TrainingConfig::default());
        for i in 0..50 {
            let x = (i % 4) as f64 / 3.0;
            network.train(&[x, 1.0 - x], &[x * 0.5]).unwrap();
        }

        let mut biases = 0;
        for layer in network.layers() {
            for neuron in network.layer_neurons(layer) {
                if neuron.is_bias() {
                    biases += 1;
                    assert_eq!(neuron.output(), 1.0);
                    assert_eq!(neuron.gradient(), 0.0);
                    assert!(neuron.incoming().is_empty());
                }
            }
        }
        assert_eq!(biases, 3);
    }

    #[test]
    fn momentum() {
        let example = ([0.4, -0.6], [0.9]);
        let without = TrainingConfig {
            alpha: 0.0,
            ..Default::default()
        };
        let with = TrainingConfig {
            alpha: 0.5,
            ..Default::default()
        };
        let mut plain = random(&[2, 3, 1], without);
        let mut inert = random(&[2, 3, 1], with);

        //первый проход: прошлых изменений нет, веса совпадают
        plain.train(&example.0, &example.1).unwrap();
        inert.train(&example.0, &example.1).unwrap();
        let a: Vec<f64> = plain.weights().collect();
        let b: Vec<f64> = inert.weights().collect();
        assert_eq!(a, b);

        //второй проход: момент меняет результат
        plain.train(&example.0, &example.1).unwrap();
        inert.train(&example.0, &example.1).unwrap();
        let a: Vec<f64> = plain.weights().collect();
        let b: Vec<f64> = inert.weights().collect();
        assert!(a.iter().zip(&b).any(|(x, y)| x != y));
    }

    #[test]
    fn no_momentum_uses_only_gradient() {
        let config = TrainingConfig {
            eta: 0.3,
            alpha: 0.0,
            error_smoothing: 0.0,
        };
        let mut network =
            Network::from_weights(config, &LayerTopology::chain(&[1, 1]), [0.5, 0.25]).unwrap();
        for _ in 0..2 {
            let before: Vec<f64> = network.weights().collect();
            network.feed_forward(&[1.0]).unwrap();
            let out = network.results()[0];
            network.back_propagate(&[-0.5]).unwrap();
            let gradient = (-0.5 - out) * (1.0 - out * out);

            let after: Vec<f64> = network.weights().collect();
            assert_relative_eq!(after[0], before[0] + 0.3 * 1.0 * gradient, epsilon = 1e-12);
            assert_relative_eq!(after[1], before[1] + 0.3 * 1.0 * gradient, epsilon = 1e-12);
        }
    }

    #[test]
    fn xor() {
        let examples = [
            ([0.0, 0.0], [0.0]),
            ([0.0, 1.0], [1.0]),
            ([1.0, 0.0], [1.0]),
            ([1.0, 1.0], [0.0]),
        ];
        let mut network = random(&[2, 4, 1], TrainingConfig::default());

        let mut errors = Vec::new();
        for _ in 0..1000 {
            for (inputs, targets) in &examples {
                network.feed_forward(inputs).unwrap();
                network.back_propagate(targets).unwrap();
                errors.push(network.recent_average_error());
            }
        }
        let window = 200;
        let head: f64 = errors[..window].iter().sum::<f64>() / window as f64;
        let tail: f64 = errors[errors.len() - window..].iter().sum::<f64>() / window as f64;
        assert!(tail < head, "error did not decrease: {head} -> {tail}");
    }
}
