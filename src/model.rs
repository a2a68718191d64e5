//! RetinaFace network definition on the Burn framework.
//!
//! A ResNet-50 pre-activation backbone feeding a three-scale feature pyramid
//! with SSH context modules and per-scale class/box/landmark heads. The graph
//! topology is fixed; spatial input size is left unbound so one built model
//! serves any image size. Every convolution and batch-norm layer is bound to
//! its [`WeightStore`] entry by exact layer name at construction time.

use burn::module::{Module, Param, RunningState};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::tensor::backend::Backend;
use burn::tensor::module::max_pool2d;
use burn::tensor::{activation, Tensor};

use std::path::Path;

use crate::error::{BuildError, Error, ShapeMismatchError};
use crate::weights::WeightStore;

/// Batch-norm epsilon of the source model's training framework. Kept
/// bit-exact; a library default here would shift every feature map.
pub const BN_EPSILON: f64 = 1.9999999494757503e-5;

/// Per-head output widths. The reference weights use two anchors per location
/// and five facial landmark points.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RetinaFaceConfig {
    pub anchors_per_location: usize,
    pub landmark_points: usize,
}

impl Default for RetinaFaceConfig {
    fn default() -> Self {
        Self {
            anchors_per_location: 2,
            landmark_points: 5,
        }
    }
}

impl RetinaFaceConfig {
    /// Two class scores per anchor.
    pub fn cls_channels(&self) -> usize {
        2 * self.anchors_per_location
    }

    /// Four box offsets per anchor.
    pub fn bbox_channels(&self) -> usize {
        4 * self.anchors_per_location
    }

    /// Two coordinates per landmark point per anchor.
    pub fn landmark_channels(&self) -> usize {
        2 * self.landmark_points * self.anchors_per_location
    }
}

/// Builds a convolution bound to the store entry named `name`.
///
/// Stored kernels use the source framework's channels-last layout
/// `[kh, kw, cin, cout]` and are permuted here to Burn's `[cout, cin, kh, kw]`.
/// A bias is bound iff the entry carries one.
#[allow(clippy::too_many_arguments)]
fn bind_conv<B: Backend>(
    store: &WeightStore,
    name: &str,
    cin: usize,
    cout: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
    device: &B::Device,
) -> Result<Conv2d<B>, BuildError> {
    let weights = store.conv(name)?;
    let expected = [kernel, kernel, cin, cout];
    if weights.kernel.shape.as_slice() != expected {
        return Err(ShapeMismatchError::new(name, &expected, &weights.kernel.shape).into());
    }

    let kernel_tensor: Tensor<B, 4> =
        Tensor::from_data(weights.kernel.clone(), device).permute([3, 2, 0, 1]);

    let mut conv = Conv2dConfig::new([cin, cout], [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_bias(weights.bias.is_some())
        .init(device);
    conv.weight = Param::from_tensor(kernel_tensor);
    if let Some(bias) = &weights.bias {
        conv.bias = Some(Param::from_tensor(Tensor::from_data(bias.clone(), device)));
    }
    Ok(conv)
}

/// Builds a batch-norm layer bound to the store entry named `name`.
fn bind_bn<B: Backend>(
    store: &WeightStore,
    name: &str,
    channels: usize,
    device: &B::Device,
) -> Result<BatchNorm<B>, BuildError> {
    let weights = store.bn(name)?;
    if weights.gamma.shape[0] != channels {
        return Err(ShapeMismatchError::new(name, &[channels], &weights.gamma.shape).into());
    }

    let mut bn = BatchNormConfig::new(channels)
        .with_epsilon(BN_EPSILON)
        .init(device);
    bn.gamma = Param::from_tensor(Tensor::from_data(weights.gamma.clone(), device));
    bn.beta = Param::from_tensor(Tensor::from_data(weights.beta.clone(), device));
    bn.running_mean = RunningState::new(Tensor::from_data(weights.running_mean.clone(), device));
    bn.running_var = RunningState::new(Tensor::from_data(weights.running_var.clone(), device));
    Ok(bn)
}

/// Nearest-neighbour spatial upsampling by repeating each pixel.
#[derive(Module, Debug, Clone)]
pub struct Upsample {
    scale_factor: usize,
}

impl Upsample {
    pub fn new(scale_factor: usize) -> Self {
        Self { scale_factor }
    }

    pub fn forward<B: Backend>(&self, xs: Tensor<B, 4>) -> Tensor<B, 4> {
        let s = self.scale_factor;
        // Interleave repeats on each spatial axis:
        // [b, c, h, w] -> [b, c, h, s, w] -> [b, c, h*s, w] -> [b, c, h*s, w*s]
        let xs: Tensor<B, 5> = xs.unsqueeze_dim(3);
        let xs = xs.repeat(&[1, 1, 1, s, 1]);
        let xs: Tensor<B, 4> = xs.flatten(2, 3);
        let xs: Tensor<B, 5> = xs.unsqueeze_dim(4);
        let xs = xs.repeat(&[1, 1, 1, 1, s]);
        xs.flatten(3, 4)
    }
}

/// Trims `x` on the bottom/right so its spatial size matches `reference`.
///
/// ×2 upsampling overshoots its fusion target whenever the input size is not
/// divisible by the accumulated downsampling factor; the overshoot is at most
/// one row/column and always on the bottom/right with top-left alignment.
pub fn crop_to_match<B: Backend>(
    x: Tensor<B, 4>,
    reference: &Tensor<B, 4>,
    op: &str,
) -> Result<Tensor<B, 4>, ShapeMismatchError> {
    let [_, _, h, w] = x.dims();
    let [_, _, th, tw] = reference.dims();
    if h < th || w < tw {
        return Err(ShapeMismatchError::new(op, &reference.dims(), &x.dims()));
    }
    Ok(x.narrow(2, 0, th).narrow(3, 0, tw))
}

/// Elementwise merge of two equally shaped feature maps.
fn fuse_add<B: Backend>(
    a: Tensor<B, 4>,
    b: Tensor<B, 4>,
    op: &str,
) -> Result<Tensor<B, 4>, ShapeMismatchError> {
    if a.dims() != b.dims() {
        return Err(ShapeMismatchError::new(op, &a.dims(), &b.dims()));
    }
    Ok(a + b)
}

/// Folds per-pixel anchor-class scores `(n, 2a, h, w)` into `(n, 2, a*h, w)`
/// so a softmax over axis 1 is the per-anchor two-class softmax.
///
/// The channel axis is class-major (`[cls0·a0, cls0·a1, cls1·a0, cls1·a1]`
/// for two anchors), matching the parameter-source framework's convention.
pub fn fold_class_scores<B: Backend>(
    x: Tensor<B, 4>,
) -> Result<Tensor<B, 4>, ShapeMismatchError> {
    let [n, c, h, w] = x.dims();
    if c % 2 != 0 {
        return Err(ShapeMismatchError::new(
            "fold_class_scores",
            &[n, 2 * c.div_ceil(2), h, w],
            &[n, c, h, w],
        ));
    }
    Ok(x.reshape([n, 2, (c / 2) * h, w]))
}

/// Exact inverse of [`fold_class_scores`] for a given anchor count:
/// `(n, 2, a*h, w)` back to `(n, 2a, h, w)`.
pub fn unfold_class_scores<B: Backend>(
    x: Tensor<B, 4>,
    anchors: usize,
) -> Result<Tensor<B, 4>, ShapeMismatchError> {
    let [n, classes, ah, w] = x.dims();
    if classes != 2 || anchors == 0 || ah % anchors != 0 {
        return Err(ShapeMismatchError::new(
            "unfold_class_scores",
            &[n, 2, anchors.max(1) * ah.div_ceil(anchors.max(1)), w],
            &[n, classes, ah, w],
        ));
    }
    Ok(x.reshape([n, 2 * anchors, ah / anchors, w]))
}

/// Moves a channels-first feature map back to the published channels-last
/// layout.
fn to_channels_last<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    x.permute([0, 2, 3, 1])
}

/// Stem: input normalization, 7×7/2 convolution and 3×3/2 max pool.
#[derive(Module, Debug)]
pub struct Stem<B: Backend> {
    bn_data: BatchNorm<B>,
    conv0: Conv2d<B>,
    bn0: BatchNorm<B>,
}

impl<B: Backend> Stem<B> {
    fn bind(store: &WeightStore, device: &B::Device) -> Result<Self, BuildError> {
        Ok(Self {
            bn_data: bind_bn(store, "bn_data", 3, device)?,
            conv0: bind_conv(store, "conv0", 3, 64, 7, 2, 3, device)?,
            bn0: bind_bn(store, "bn0", 64, device)?,
        })
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bn_data.forward(x);
        let x = activation::relu(self.bn0.forward(self.conv0.forward(x)));
        max_pool2d(x, [3, 3], [2, 2], [1, 1], [1, 1], false)
    }
}

/// Pre-activation bottleneck unit.
///
/// `bn1 -> relu -> conv1 1×1 -> bn2 -> relu -> conv2 3×3 -> bn3 -> relu ->
/// conv3 1×1`, added to the shortcut. The first unit of a stage projects the
/// shortcut with a 1×1 convolution computed from the same post-`relu1`
/// activation as the main branch; later units pass the raw input through.
#[derive(Module, Debug)]
pub struct ResidualUnit<B: Backend> {
    bn1: BatchNorm<B>,
    conv1: Conv2d<B>,
    bn2: BatchNorm<B>,
    conv2: Conv2d<B>,
    bn3: BatchNorm<B>,
    conv3: Conv2d<B>,
    shortcut: Option<Conv2d<B>>,
}

impl<B: Backend> ResidualUnit<B> {
    #[allow(clippy::too_many_arguments)]
    fn bind(
        store: &WeightStore,
        stage: usize,
        unit: usize,
        cin: usize,
        cmid: usize,
        cout: usize,
        stride: usize,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        let name = |suffix: &str| format!("stage{stage}_unit{unit}_{suffix}");
        let shortcut = if unit == 1 {
            Some(bind_conv(store, &name("sc"), cin, cout, 1, stride, 0, device)?)
        } else {
            None
        };
        Ok(Self {
            bn1: bind_bn(store, &name("bn1"), cin, device)?,
            conv1: bind_conv(store, &name("conv1"), cin, cmid, 1, 1, 0, device)?,
            bn2: bind_bn(store, &name("bn2"), cmid, device)?,
            conv2: bind_conv(store, &name("conv2"), cmid, cmid, 3, stride, 1, device)?,
            bn3: bind_bn(store, &name("bn3"), cmid, device)?,
            conv3: bind_conv(store, &name("conv3"), cmid, cout, 1, 1, 0, device)?,
            shortcut,
        })
    }

    /// Returns the unit output and the post-`relu2` feature. The first units
    /// of stages 3 and 4 expose that feature to the pyramid laterals before
    /// their stride-2 `conv2` halves it.
    fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let pre = activation::relu(self.bn1.forward(x.clone()));
        let shortcut = match &self.shortcut {
            Some(conv) => conv.forward(pre.clone()),
            None => x,
        };
        let y = self.conv1.forward(pre);
        let tap = activation::relu(self.bn2.forward(y));
        let y = self.conv2.forward(tap.clone());
        let y = activation::relu(self.bn3.forward(y));
        let y = self.conv3.forward(y);
        (y + shortcut, tap)
    }
}

/// One backbone stage: a projecting first unit followed by identity units.
#[derive(Module, Debug)]
pub struct Stage<B: Backend> {
    first: ResidualUnit<B>,
    rest: Vec<ResidualUnit<B>>,
}

impl<B: Backend> Stage<B> {
    #[allow(clippy::too_many_arguments)]
    fn bind(
        store: &WeightStore,
        stage: usize,
        units: usize,
        cin: usize,
        cmid: usize,
        cout: usize,
        stride: usize,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        let first = ResidualUnit::bind(store, stage, 1, cin, cmid, cout, stride, device)?;
        let rest = (2..=units)
            .map(|unit| ResidualUnit::bind(store, stage, unit, cout, cmid, cout, 1, device))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { first, rest })
    }

    /// Returns the stage output and the first unit's `relu2` tap.
    fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let (mut y, tap) = self.first.forward(x);
        for unit in &self.rest {
            y = unit.forward(y).0;
        }
        (y, tap)
    }
}

/// Convolution + batch norm + ReLU, the pyramid's lateral/aggregation block.
/// The batch-norm entry is named `<conv>_bn` in the store.
#[derive(Module, Debug)]
pub struct ConvBnRelu<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
}

impl<B: Backend> ConvBnRelu<B> {
    fn bind(
        store: &WeightStore,
        name: &str,
        cin: usize,
        cout: usize,
        kernel: usize,
        padding: usize,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            conv: bind_conv(store, name, cin, cout, kernel, 1, padding, device)?,
            bn: bind_bn(store, &format!("{name}_bn"), cout, device)?,
        })
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        activation::relu(self.bn.forward(self.conv.forward(x)))
    }
}

/// SSH context module: a direct 3×3 branch and two chained 3×3 context
/// branches, batch-normalized, concatenated channel-wise and rectified.
#[derive(Module, Debug)]
pub struct ContextModule<B: Backend> {
    det_conv1: Conv2d<B>,
    det_conv1_bn: BatchNorm<B>,
    context_conv1: Conv2d<B>,
    context_conv1_bn: BatchNorm<B>,
    context_conv2: Conv2d<B>,
    context_conv2_bn: BatchNorm<B>,
    context_conv3_1: Conv2d<B>,
    context_conv3_1_bn: BatchNorm<B>,
    context_conv3_2: Conv2d<B>,
    context_conv3_2_bn: BatchNorm<B>,
}

impl<B: Backend> ContextModule<B> {
    fn bind(store: &WeightStore, scale: &str, device: &B::Device) -> Result<Self, BuildError> {
        let name = |suffix: &str| format!("ssh_{scale}_det_{suffix}");
        Ok(Self {
            det_conv1: bind_conv(store, &name("conv1"), 256, 256, 3, 1, 1, device)?,
            det_conv1_bn: bind_bn(store, &name("conv1_bn"), 256, device)?,
            context_conv1: bind_conv(store, &name("context_conv1"), 256, 128, 3, 1, 1, device)?,
            context_conv1_bn: bind_bn(store, &name("context_conv1_bn"), 128, device)?,
            context_conv2: bind_conv(store, &name("context_conv2"), 128, 128, 3, 1, 1, device)?,
            context_conv2_bn: bind_bn(store, &name("context_conv2_bn"), 128, device)?,
            context_conv3_1: bind_conv(store, &name("context_conv3_1"), 128, 128, 3, 1, 1, device)?,
            context_conv3_1_bn: bind_bn(store, &name("context_conv3_1_bn"), 128, device)?,
            context_conv3_2: bind_conv(store, &name("context_conv3_2"), 128, 128, 3, 1, 1, device)?,
            context_conv3_2_bn: bind_bn(store, &name("context_conv3_2_bn"), 128, device)?,
        })
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let direct = self.det_conv1_bn.forward(self.det_conv1.forward(x.clone()));
        let ctx = activation::relu(
            self.context_conv1_bn
                .forward(self.context_conv1.forward(x)),
        );
        let short = self
            .context_conv2_bn
            .forward(self.context_conv2.forward(ctx.clone()));
        let long = activation::relu(
            self.context_conv3_1_bn
                .forward(self.context_conv3_1.forward(ctx)),
        );
        let long = self
            .context_conv3_2_bn
            .forward(self.context_conv3_2.forward(long));
        activation::relu(Tensor::cat(vec![direct, short, long], 1))
    }
}

/// Per-scale detection head: three independent 1×1 convolutions over the
/// shared 512-channel feature. Classification scores go through the
/// fold/softmax/unfold sequence before publication.
#[derive(Module, Debug)]
pub struct DetectionHead<B: Backend> {
    cls_score: Conv2d<B>,
    bbox_pred: Conv2d<B>,
    landmark_pred: Conv2d<B>,
    anchors: usize,
}

impl<B: Backend> DetectionHead<B> {
    fn bind(
        store: &WeightStore,
        stride: usize,
        config: &RetinaFaceConfig,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        let name = |head: &str| format!("face_rpn_{head}_stride{stride}");
        Ok(Self {
            cls_score: bind_conv(
                store,
                &name("cls_score"),
                512,
                config.cls_channels(),
                1,
                1,
                0,
                device,
            )?,
            bbox_pred: bind_conv(
                store,
                &name("bbox_pred"),
                512,
                config.bbox_channels(),
                1,
                1,
                0,
                device,
            )?,
            landmark_pred: bind_conv(
                store,
                &name("landmark_pred"),
                512,
                config.landmark_channels(),
                1,
                1,
                0,
                device,
            )?,
            anchors: config.anchors_per_location,
        })
    }

    fn forward(&self, feature: Tensor<B, 4>) -> Result<ScaleOutputs<B>, ShapeMismatchError> {
        let score = self.cls_score.forward(feature.clone());
        let folded = fold_class_scores(score)?;
        let prob = activation::softmax(folded, 1);
        let cls_prob = unfold_class_scores(prob, self.anchors)?;
        Ok(ScaleOutputs {
            cls_prob: to_channels_last(cls_prob),
            bbox: to_channels_last(self.bbox_pred.forward(feature.clone())),
            landmark: to_channels_last(self.landmark_pred.forward(feature)),
        })
    }
}

/// One scale's outputs, channels-last `(batch, h, w, c)`.
#[derive(Debug, Clone)]
pub struct ScaleOutputs<B: Backend> {
    pub cls_prob: Tensor<B, 4>,
    pub bbox: Tensor<B, 4>,
    pub landmark: Tensor<B, 4>,
}

/// The nine detection outputs, coarsest scale first.
#[derive(Debug, Clone)]
pub struct FaceOutputs<B: Backend> {
    pub stride32: ScaleOutputs<B>,
    pub stride16: ScaleOutputs<B>,
    pub stride8: ScaleOutputs<B>,
}

impl<B: Backend> FaceOutputs<B> {
    /// Flattens into the fixed published order: `(cls_prob_32, bbox_32,
    /// landmark_32, cls_prob_16, bbox_16, landmark_16, cls_prob_8, bbox_8,
    /// landmark_8)`.
    pub fn into_vec(self) -> Vec<Tensor<B, 4>> {
        vec![
            self.stride32.cls_prob,
            self.stride32.bbox,
            self.stride32.landmark,
            self.stride16.cls_prob,
            self.stride16.bbox,
            self.stride16.landmark,
            self.stride8.cls_prob,
            self.stride8.bbox,
            self.stride8.landmark,
        ]
    }
}

/// The complete RetinaFace inference graph.
///
/// Immutable once built; `forward` takes `&self` and holds no interior state,
/// so a built model can serve concurrent invocations.
#[derive(Module, Debug)]
pub struct RetinaFace<B: Backend> {
    stem: Stem<B>,
    stage1: Stage<B>,
    stage2: Stage<B>,
    stage3: Stage<B>,
    stage4: Stage<B>,
    bn1: BatchNorm<B>,
    c3_lateral: ConvBnRelu<B>,
    c2_lateral: ConvBnRelu<B>,
    m1_red: ConvBnRelu<B>,
    c2_aggr: ConvBnRelu<B>,
    c1_aggr: ConvBnRelu<B>,
    upsample: Upsample,
    m3_context: ContextModule<B>,
    m2_context: ContextModule<B>,
    m1_context: ContextModule<B>,
    head_stride32: DetectionHead<B>,
    head_stride16: DetectionHead<B>,
    head_stride8: DetectionHead<B>,
}

impl<B: Backend> RetinaFace<B> {
    /// Constructs the graph and binds every layer from the store.
    ///
    /// Atomic: returns the fully bound model or the first binding error;
    /// partially bound graphs never escape.
    pub fn from_store(
        store: &WeightStore,
        config: &RetinaFaceConfig,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        let model = Self {
            stem: Stem::bind(store, device)?,
            stage1: Stage::bind(store, 1, 3, 64, 64, 256, 1, device)?,
            stage2: Stage::bind(store, 2, 4, 256, 128, 512, 2, device)?,
            stage3: Stage::bind(store, 3, 6, 512, 256, 1024, 2, device)?,
            stage4: Stage::bind(store, 4, 3, 1024, 512, 2048, 2, device)?,
            bn1: bind_bn(store, "bn1", 2048, device)?,
            c3_lateral: ConvBnRelu::bind(store, "ssh_c3_lateral", 2048, 256, 1, 0, device)?,
            c2_lateral: ConvBnRelu::bind(store, "ssh_c2_lateral", 512, 256, 1, 0, device)?,
            m1_red: ConvBnRelu::bind(store, "ssh_m1_red_conv", 256, 256, 1, 0, device)?,
            c2_aggr: ConvBnRelu::bind(store, "ssh_c2_aggr", 256, 256, 3, 1, device)?,
            c1_aggr: ConvBnRelu::bind(store, "ssh_c1_aggr", 256, 256, 3, 1, device)?,
            upsample: Upsample::new(2),
            m3_context: ContextModule::bind(store, "m3", device)?,
            m2_context: ContextModule::bind(store, "m2", device)?,
            m1_context: ContextModule::bind(store, "m1", device)?,
            head_stride32: DetectionHead::bind(store, 32, config, device)?,
            head_stride16: DetectionHead::bind(store, 16, config, device)?,
            head_stride8: DetectionHead::bind(store, 8, config, device)?,
        };
        log::info!(
            "RetinaFace graph bound against a store of {} layers",
            store.len()
        );
        Ok(model)
    }

    /// Loads the archive at `path` and builds the model from it.
    pub fn load(
        path: impl AsRef<Path>,
        config: &RetinaFaceConfig,
        device: &B::Device,
    ) -> Result<Self, Error> {
        let store = WeightStore::load(path)?;
        Ok(Self::from_store(&store, config, device)?)
    }

    /// Runs the detector on a channels-last image batch `(batch, h, w, 3)`.
    ///
    /// Height and width are unconstrained beyond surviving the stride-32
    /// reduction; outputs are channels-last at strides 32, 16 and 8.
    pub fn forward(&self, input: Tensor<B, 4>) -> Result<FaceOutputs<B>, ShapeMismatchError> {
        let [n, h, w, c] = input.dims();
        if c != 3 || h < 32 || w < 32 {
            return Err(ShapeMismatchError::new(
                "input",
                &[n, h.max(32), w.max(32), 3],
                &[n, h, w, c],
            ));
        }
        let x = input.permute([0, 3, 1, 2]);

        let x = self.stem.forward(x);
        let (x, _) = self.stage1.forward(x);
        let (x, _) = self.stage2.forward(x);
        let (x, stride8_tap) = self.stage3.forward(x);
        let (x, stride16_tap) = self.stage4.forward(x);
        let x = activation::relu(self.bn1.forward(x));

        let feat32 = self.c3_lateral.forward(x);
        let c2_lat = self.c2_lateral.forward(stride16_tap);
        let m1_lat = self.m1_red.forward(stride8_tap);

        let up = crop_to_match(self.upsample.forward(feat32.clone()), &c2_lat, "crop_c3_up")?;
        let feat16 = self.c2_aggr.forward(fuse_add(c2_lat, up, "c2_fuse")?);

        let up = crop_to_match(self.upsample.forward(feat16.clone()), &m1_lat, "crop_m2_up")?;
        let feat8 = self.c1_aggr.forward(fuse_add(m1_lat, up, "c1_fuse")?);

        Ok(FaceOutputs {
            stride32: self.head_stride32.forward(self.m3_context.forward(feat32))?,
            stride16: self.head_stride16.forward(self.m2_context.forward(feat16))?,
            stride8: self.head_stride8.forward(self.m1_context.forward(feat8))?,
        })
    }
}
