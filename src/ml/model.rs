// ============================================================
// Layer 5 — SCI Network
// ============================================================
// Self-Calibrated Illumination network, unrolled over `stage`
// stages during training:
//
//   input_op = x
//   for each stage:
//       illu     = enhance(input_op)         ∈ [1e-4, 1]
//       r        = clamp(x / illu, 0, 1)     ← enhanced image
//       att      = calibrate(r)
//       input_op = x + att                   ← next stage input
//
// Both sub-networks are weight-shared across stages, and inside
// each sub-network the residual block is applied `layers` times
// with the same weights.
//
// Weight init is explicit: NetworkConfig::init builds with Burn's
// defaults, Network::init_weights then re-initialises the six
// parts listed in NetworkPart::ALL.
//
// Reference: Burn Book §3 (Modules), Ma et al. (2022)

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::ml::loss;

/// Lower bound of the estimated illumination; keeps `input / illu` finite.
const MIN_ILLUMINATION: f64 = 1e-4;

#[derive(Config, Debug)]
pub struct NetworkConfig {
    /// Enhance/calibrate stages unrolled per forward pass
    #[config(default = 3)]
    pub stage: usize,
    /// Times the shared enhance block is applied
    #[config(default = 1)]
    pub enhance_layers: usize,
    #[config(default = 3)]
    pub enhance_channels: usize,
    /// Times the shared calibrate block pair is applied
    #[config(default = 3)]
    pub calibrate_layers: usize,
    #[config(default = 16)]
    pub calibrate_channels: usize,
}

impl NetworkConfig {
    /// Build the network with Burn's default parameter init.
    /// Call [`Network::init_weights`] afterwards for the SCI init.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Network<B> {
        let ec = self.enhance_channels;
        let enhance = EnhanceNetwork {
            in_conv:  ConvBlock::new(3, ec, false, device),
            conv:     ConvBlock::new(ec, ec, true, device),
            out_conv: conv3x3(ec, 3, device),
            layers:   self.enhance_layers,
        };

        let cc = self.calibrate_channels;
        let calibrate = CalibrateNetwork {
            in_conv:  ConvBlock::new(3, cc, true, device),
            convs:    vec![ConvBlock::new(cc, cc, true, device), ConvBlock::new(cc, cc, true, device)],
            out_conv: conv3x3(cc, 3, device),
            layers:   self.calibrate_layers,
        };

        Network { enhance, calibrate, stage: self.stage }
    }
}

fn conv3x3<B: Backend>(channels_in: usize, channels_out: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([channels_in, channels_out], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

/// 3x3 convolution, optional BatchNorm, ReLU.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(channels_in: usize, channels_out: usize, with_norm: bool, device: &B::Device) -> Self {
        let norm = with_norm.then(|| BatchNormConfig::new(channels_out).init(device));
        Self { conv: conv3x3(channels_in, channels_out, device), norm }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        relu(x)
    }
}

/// Estimates the illumination map of its input.
#[derive(Module, Debug)]
pub struct EnhanceNetwork<B: Backend> {
    pub in_conv:  ConvBlock<B>,
    pub conv:     ConvBlock<B>,
    pub out_conv: Conv2d<B>,
    pub layers:   usize,
}

impl<B: Backend> EnhanceNetwork<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut fea = self.in_conv.forward(x.clone());
        // Residual blocks share one set of weights.
        for _ in 0..self.layers {
            fea = fea.clone() + self.conv.forward(fea);
        }
        let fea = sigmoid(self.out_conv.forward(fea));
        (fea + x).clamp(MIN_ILLUMINATION, 1.0)
    }
}

/// Maps a stage's reflectance to a correction for the next stage's input.
#[derive(Module, Debug)]
pub struct CalibrateNetwork<B: Backend> {
    pub in_conv:  ConvBlock<B>,
    pub convs:    Vec<ConvBlock<B>>,
    pub out_conv: Conv2d<B>,
    pub layers:   usize,
}

impl<B: Backend> CalibrateNetwork<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut fea = self.in_conv.forward(x.clone());
        for _ in 0..self.layers {
            let mut h = fea.clone();
            for block in &self.convs {
                h = block.forward(h);
            }
            fea = fea + h;
        }
        let fea = sigmoid(self.out_conv.forward(fea));
        x - fea
    }
}

#[derive(Module, Debug)]
pub struct Network<B: Backend> {
    pub enhance:   EnhanceNetwork<B>,
    pub calibrate: CalibrateNetwork<B>,
    pub stage:     usize,
}

/// Per-stage outputs of one forward pass; every Vec has `stage` entries.
pub struct NetworkOutput<B: Backend> {
    /// Illumination estimated at each stage
    pub illumination: Vec<Tensor<B, 4>>,
    /// Enhanced image (input / illumination) at each stage
    pub reflectance:  Vec<Tensor<B, 4>>,
    /// Input fed into each stage
    pub inputs:       Vec<Tensor<B, 4>>,
    /// Magnitude of the calibration correction at each stage
    pub attention:    Vec<Tensor<B, 4>>,
}

impl<B: Backend> Network<B> {
    /// x: [batch, 3, H, W] in [0, 1]
    pub fn forward(&self, input: Tensor<B, 4>) -> NetworkOutput<B> {
        let mut out = NetworkOutput {
            illumination: Vec::with_capacity(self.stage),
            reflectance:  Vec::with_capacity(self.stage),
            inputs:       Vec::with_capacity(self.stage),
            attention:    Vec::with_capacity(self.stage),
        };

        let mut input_op = input.clone();
        for _ in 0..self.stage {
            out.inputs.push(input_op.clone());
            let illu = self.enhance.forward(input_op);
            let r    = (input.clone() / illu.clone()).clamp(0.0, 1.0);
            let att  = self.calibrate.forward(r.clone());
            input_op = input.clone() + att.clone();

            out.illumination.push(illu);
            out.reflectance.push(r);
            out.attention.push(att.abs());
        }
        out
    }

    /// Self-supervised training loss: sum over stages of the loss between
    /// each stage's input and its estimated illumination.
    pub fn forward_loss(&self, input: Tensor<B, 4>) -> Tensor<B, 1> {
        let device = input.device();
        let out = self.forward(input);
        out.inputs
            .into_iter()
            .zip(out.illumination)
            .fold(Tensor::zeros([1], &device), |acc, (stage_in, illu)| {
                acc + loss::stage_loss(stage_in, illu)
            })
    }

    /// Re-initialise one named part.
    pub fn init_part(mut self, part: NetworkPart, device: &B::Device) -> Self {
        tracing::debug!("Initialising {}", part.name());
        match part {
            NetworkPart::EnhanceIn     => self.enhance.in_conv    = self.enhance.in_conv.init_weights(device),
            NetworkPart::EnhanceConv   => self.enhance.conv       = self.enhance.conv.init_weights(device),
            NetworkPart::EnhanceOut    => self.enhance.out_conv   = self.enhance.out_conv.init_weights(device),
            NetworkPart::CalibrateIn   => self.calibrate.in_conv  = self.calibrate.in_conv.init_weights(device),
            NetworkPart::CalibrateConvs => self.calibrate.convs   = self.calibrate.convs.init_weights(device),
            NetworkPart::CalibrateOut  => self.calibrate.out_conv = self.calibrate.out_conv.init_weights(device),
        }
        self
    }

    /// Apply the SCI initialisation to every part in [`NetworkPart::ALL`], in order.
    pub fn init_weights(self, device: &B::Device) -> Self {
        NetworkPart::ALL
            .into_iter()
            .fold(self, |model, part| model.init_part(part, device))
    }
}

/// The sub-modules that receive the SCI weight initialisation.
/// Anything not listed keeps Burn's default initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkPart {
    EnhanceIn,
    EnhanceConv,
    EnhanceOut,
    CalibrateIn,
    CalibrateConvs,
    CalibrateOut,
}

impl NetworkPart {
    pub const ALL: [NetworkPart; 6] = [
        NetworkPart::EnhanceIn,
        NetworkPart::EnhanceConv,
        NetworkPart::EnhanceOut,
        NetworkPart::CalibrateIn,
        NetworkPart::CalibrateConvs,
        NetworkPart::CalibrateOut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NetworkPart::EnhanceIn      => "enhance.in_conv",
            NetworkPart::EnhanceConv    => "enhance.conv",
            NetworkPart::EnhanceOut     => "enhance.out_conv",
            NetworkPart::CalibrateIn    => "calibrate.in_conv",
            NetworkPart::CalibrateConvs => "calibrate.convs",
            NetworkPart::CalibrateOut   => "calibrate.out_conv",
        }
    }
}

/// SCI initialisation: conv weights ~ N(0, 0.02) with zero bias,
/// BatchNorm scale ~ N(1, 0.02).
pub trait InitWeights<B: Backend>: Sized {
    fn init_weights(self, device: &B::Device) -> Self;
}

impl<B: Backend> InitWeights<B> for Conv2d<B> {
    fn init_weights(mut self, device: &B::Device) -> Self {
        let shape = self.weight.val().dims();
        self.weight = Initializer::Normal { mean: 0.0, std: 0.02 }.init(shape, device);
        self.bias = self.bias.map(|bias| {
            let [channels] = bias.val().dims();
            Initializer::Zeros.init([channels], device)
        });
        self
    }
}

impl<B: Backend> InitWeights<B> for BatchNorm<B, 2> {
    fn init_weights(mut self, device: &B::Device) -> Self {
        let [channels] = self.gamma.val().dims();
        self.gamma = Initializer::Normal { mean: 1.0, std: 0.02 }.init([channels], device);
        self
    }
}

impl<B: Backend> InitWeights<B> for ConvBlock<B> {
    fn init_weights(self, device: &B::Device) -> Self {
        Self {
            conv: self.conv.init_weights(device),
            norm: self.norm.map(|n| n.init_weights(device)),
        }
    }
}

impl<B: Backend> InitWeights<B> for Vec<ConvBlock<B>> {
    fn init_weights(self, device: &B::Device) -> Self {
        self.into_iter().map(|b| b.init_weights(device)).collect()
    }
}
