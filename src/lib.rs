//! Многослойная сеть прямого распространения с обучением
//! обратным распространением ошибки и моментом.
//!
//! Сеть строится по топологии (число нейронов в каждом слое), веса
//! задаются генератором случайных чисел или явно:
//!
//! ```
//! use lib_backprop_network::{LayerTopology, Network, TrainingConfig};
//!
//! let topology = [LayerTopology { neurons: 2 }, LayerTopology { neurons: 1 }];
//! let mut network =
//!     Network::from_weights(TrainingConfig::default(), &topology, [0.5, -0.5, 0.0]).unwrap();
//! network.feed_forward(&[1.0, 0.0]).unwrap();
//! assert!((network.results()[0] - 0.5f64.tanh()).abs() < 1e-12);
//! ```

pub use self::{
    config::*, connection::*, error::*, layer::*, layer_topology::*, network::*, neuron::*,
    training_data::*,
};
use itertools::Itertools;
use rand::{Rng, RngCore};
use std::ops::Range;

mod config;
mod connection;
mod error;
mod layer;
mod layer_topology;
mod network;
mod neuron;
mod training_data;
