use burn::module::{
    AutodiffModule, Content, Devices, ModuleDisplay, ModuleDisplayDefault, ModuleMapper,
    ModuleVisitor,
};
use burn::nn::conv::Conv2d;
use burn::prelude::*;
use burn::record::{PrecisionSettings, Record};
use burn::tensor::backend::AutodiffBackend;

use super::activation::Activation;
use super::norm::Norm;
use super::padding::Pad;
use super::rr_block::ResInResBlock;
use super::upsample::Upsample2d;

/// Closed set of layer variants, dispatched by a single forward match.
#[derive(Debug)]
pub enum Layer<B: Backend> {
    Conv(Conv2d<B>),
    Act(Activation<B>),
    Pad(Pad),
    Norm(Norm<B>),
    Upsample(Upsample2d),
    Residual(ResInResBlock<B>),
    Shortcut(ShortcutBlock<B>),
}

impl<B: Backend> Layer<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Layer::Conv(layer) => layer.forward(x),
            Layer::Act(layer) => layer.forward(x),
            Layer::Pad(layer) => layer.forward(x),
            Layer::Norm(layer) => layer.forward(x),
            Layer::Upsample(layer) => layer.forward(x),
            Layer::Residual(layer) => layer.forward(x),
            Layer::Shortcut(layer) => layer.forward(x),
        }
    }
}

impl<B: Backend> From<Conv2d<B>> for Layer<B> {
    fn from(layer: Conv2d<B>) -> Self {
        Layer::Conv(layer)
    }
}

impl<B: Backend> From<Activation<B>> for Layer<B> {
    fn from(layer: Activation<B>) -> Self {
        Layer::Act(layer)
    }
}

impl<B: Backend> From<ResInResBlock<B>> for Layer<B> {
    fn from(layer: ResInResBlock<B>) -> Self {
        Layer::Residual(layer)
    }
}

impl<B: Backend> From<ShortcutBlock<B>> for Layer<B> {
    fn from(layer: ShortcutBlock<B>) -> Self {
        Layer::Shortcut(layer)
    }
}

/// Flat ordered chain of layers, evaluated front to back.
#[derive(Debug)]
pub struct Sequential<B: Backend> {
    layers: Vec<Layer<B>>,
}

impl<B: Backend> Default for Sequential<B> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

impl<B: Backend> Sequential<B> {
    pub fn single(layer: impl Into<Layer<B>>) -> Self {
        Self {
            layers: vec![layer.into()],
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.layers.iter().fold(x, |x, layer| layer.forward(x))
    }
}

/// Splices nested sequences into one flat ordered list, skipping absent
/// entries. A single item passes through untouched; relative order is always
/// preserved.
pub fn flatten<B: Backend>(items: Vec<Option<Sequential<B>>>) -> Sequential<B> {
    if items.len() == 1 {
        return items.into_iter().next().flatten().unwrap_or_default();
    }
    let mut layers = Vec::new();
    for item in items.into_iter().flatten() {
        layers.extend(item.layers);
    }
    Sequential { layers }
}

/// Adds the output of the wrapped chain to its own input.
#[derive(Debug)]
pub struct ShortcutBlock<B: Backend> {
    inner: Sequential<B>,
}

impl<B: Backend> ShortcutBlock<B> {
    pub fn new(inner: Sequential<B>) -> Self {
        Self { inner }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.inner.forward(x.clone());
        assert_eq!(
            x.dims(),
            out.dims(),
            "shortcut chain must preserve the input shape"
        );
        x + out
    }
}

// ---------------------------------------------------------------------------
// Hand-written `Module` plumbing for the three mutually recursive types above
// (`Layer` -> `ShortcutBlock` -> `Sequential` -> `Vec<Layer>`).
//
// `#[derive(Module)]` emits record item types whose serde bounds name the
// other record items in the cycle, which the trait solver rejects with E0275.
// These impls mirror the derive output exactly — same record/item shapes,
// field names, and method bodies — but declare the record items with
// `#[serde(bound = "")]`, which holds unconditionally and breaks the cycle.
// ---------------------------------------------------------------------------

/// The record type for [`Layer`].
pub enum LayerRecord<B: Backend> {
    /// The module record associative type.
    Conv(<Conv2d<B> as Module<B>>::Record),
    /// The module record associative type.
    Act(<Activation<B> as Module<B>>::Record),
    /// The module record associative type.
    Pad(<Pad as Module<B>>::Record),
    /// The module record associative type.
    Norm(<Norm<B> as Module<B>>::Record),
    /// The module record associative type.
    Upsample(<Upsample2d as Module<B>>::Record),
    /// The module record associative type.
    Residual(<ResInResBlock<B> as Module<B>>::Record),
    /// The module record associative type.
    Shortcut(<ShortcutBlock<B> as Module<B>>::Record),
}

/// The record item type for [`Layer`].
#[derive(burn::serde::Serialize, burn::serde::Deserialize)]
#[serde(crate = "burn::serde")]
#[serde(bound = "")]
pub enum LayerRecordItem<B: Backend, S: PrecisionSettings> {
    /// Variant to be serialized.
    Conv(<<Conv2d<B> as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Act(<<Activation<B> as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Pad(<<Pad as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Norm(<<Norm<B> as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Upsample(<<Upsample2d as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Residual(<<ResInResBlock<B> as Module<B>>::Record as Record<B>>::Item<S>),
    /// Variant to be serialized.
    Shortcut(<<ShortcutBlock<B> as Module<B>>::Record as Record<B>>::Item<S>),
}

impl<B: Backend> Record<B> for LayerRecord<B> {
    type Item<S: PrecisionSettings> = LayerRecordItem<B, S>;

    fn into_item<S: PrecisionSettings>(self) -> Self::Item<S> {
        match self {
            Self::Conv(record) => LayerRecordItem::Conv(Record::<B>::into_item::<S>(record)),
            Self::Act(record) => LayerRecordItem::Act(Record::<B>::into_item::<S>(record)),
            Self::Pad(record) => LayerRecordItem::Pad(Record::<B>::into_item::<S>(record)),
            Self::Norm(record) => LayerRecordItem::Norm(Record::<B>::into_item::<S>(record)),
            Self::Upsample(record) => {
                LayerRecordItem::Upsample(Record::<B>::into_item::<S>(record))
            }
            Self::Residual(record) => {
                LayerRecordItem::Residual(Record::<B>::into_item::<S>(record))
            }
            Self::Shortcut(record) => {
                LayerRecordItem::Shortcut(Record::<B>::into_item::<S>(record))
            }
        }
    }

    fn from_item<S: PrecisionSettings>(item: Self::Item<S>, device: &B::Device) -> Self {
        match item {
            LayerRecordItem::Conv(item) => Self::Conv(Record::<B>::from_item::<S>(item, device)),
            LayerRecordItem::Act(item) => Self::Act(Record::<B>::from_item::<S>(item, device)),
            LayerRecordItem::Pad(item) => Self::Pad(Record::<B>::from_item::<S>(item, device)),
            LayerRecordItem::Norm(item) => Self::Norm(Record::<B>::from_item::<S>(item, device)),
            LayerRecordItem::Upsample(item) => {
                Self::Upsample(Record::<B>::from_item::<S>(item, device))
            }
            LayerRecordItem::Residual(item) => {
                Self::Residual(Record::<B>::from_item::<S>(item, device))
            }
            LayerRecordItem::Shortcut(item) => {
                Self::Shortcut(Record::<B>::from_item::<S>(item, device))
            }
        }
    }
}

impl<B: Backend> Module<B> for Layer<B> {
    type Record = LayerRecord<B>;

    fn load_record(self, record: Self::Record) -> Self {
        match self {
            Self::Conv(module) => {
                let LayerRecord::Conv(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Conv(Module::<B>::load_record(module, r))
            }
            Self::Act(module) => {
                let LayerRecord::Act(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Act(Module::<B>::load_record(module, r))
            }
            Self::Pad(module) => {
                let LayerRecord::Pad(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Pad(Module::<B>::load_record(module, r))
            }
            Self::Norm(module) => {
                let LayerRecord::Norm(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Norm(Module::<B>::load_record(module, r))
            }
            Self::Upsample(module) => {
                let LayerRecord::Upsample(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Upsample(Module::<B>::load_record(module, r))
            }
            Self::Residual(module) => {
                let LayerRecord::Residual(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Residual(Module::<B>::load_record(module, r))
            }
            Self::Shortcut(module) => {
                let LayerRecord::Shortcut(r) = record else {
                    panic!("Can't parse record from a different variant");
                };
                Self::Shortcut(Module::<B>::load_record(module, r))
            }
        }
    }

    fn into_record(self) -> Self::Record {
        match self {
            Self::Conv(module) => LayerRecord::Conv(Module::<B>::into_record(module)),
            Self::Act(module) => LayerRecord::Act(Module::<B>::into_record(module)),
            Self::Pad(module) => LayerRecord::Pad(Module::<B>::into_record(module)),
            Self::Norm(module) => LayerRecord::Norm(Module::<B>::into_record(module)),
            Self::Upsample(module) => LayerRecord::Upsample(Module::<B>::into_record(module)),
            Self::Residual(module) => LayerRecord::Residual(Module::<B>::into_record(module)),
            Self::Shortcut(module) => LayerRecord::Shortcut(Module::<B>::into_record(module)),
        }
    }

    fn num_params(&self) -> usize {
        match self {
            Self::Conv(module) => Module::<B>::num_params(module),
            Self::Act(module) => Module::<B>::num_params(module),
            Self::Pad(module) => Module::<B>::num_params(module),
            Self::Norm(module) => Module::<B>::num_params(module),
            Self::Upsample(module) => Module::<B>::num_params(module),
            Self::Residual(module) => Module::<B>::num_params(module),
            Self::Shortcut(module) => Module::<B>::num_params(module),
        }
    }

    fn visit<Visitor: ModuleVisitor<B>>(&self, visitor: &mut Visitor) {
        match self {
            Self::Conv(module) => Module::visit(module, visitor),
            Self::Act(module) => Module::visit(module, visitor),
            Self::Pad(module) => Module::<B>::visit(module, visitor),
            Self::Norm(module) => Module::visit(module, visitor),
            Self::Upsample(module) => Module::<B>::visit(module, visitor),
            Self::Residual(module) => Module::visit(module, visitor),
            Self::Shortcut(module) => Module::visit(module, visitor),
        }
    }

    fn map<Mapper: ModuleMapper<B>>(self, mapper: &mut Mapper) -> Self {
        match self {
            Self::Conv(module) => Self::Conv(Module::<B>::map(module, mapper)),
            Self::Act(module) => Self::Act(Module::<B>::map(module, mapper)),
            Self::Pad(module) => Self::Pad(Module::<B>::map(module, mapper)),
            Self::Norm(module) => Self::Norm(Module::<B>::map(module, mapper)),
            Self::Upsample(module) => Self::Upsample(Module::<B>::map(module, mapper)),
            Self::Residual(module) => Self::Residual(Module::<B>::map(module, mapper)),
            Self::Shortcut(module) => Self::Shortcut(Module::<B>::map(module, mapper)),
        }
    }

    fn collect_devices(&self, devices: Devices<B>) -> Devices<B> {
        match self {
            Self::Conv(module) => Module::<B>::collect_devices(module, devices),
            Self::Act(module) => Module::<B>::collect_devices(module, devices),
            Self::Pad(module) => Module::<B>::collect_devices(module, devices),
            Self::Norm(module) => Module::<B>::collect_devices(module, devices),
            Self::Upsample(module) => Module::<B>::collect_devices(module, devices),
            Self::Residual(module) => Module::<B>::collect_devices(module, devices),
            Self::Shortcut(module) => Module::<B>::collect_devices(module, devices),
        }
    }

    fn to_device(self, device: &B::Device) -> Self {
        match self {
            Self::Conv(module) => Self::Conv(Module::<B>::to_device(module, device)),
            Self::Act(module) => Self::Act(Module::<B>::to_device(module, device)),
            Self::Pad(module) => Self::Pad(Module::<B>::to_device(module, device)),
            Self::Norm(module) => Self::Norm(Module::<B>::to_device(module, device)),
            Self::Upsample(module) => Self::Upsample(Module::<B>::to_device(module, device)),
            Self::Residual(module) => Self::Residual(Module::<B>::to_device(module, device)),
            Self::Shortcut(module) => Self::Shortcut(Module::<B>::to_device(module, device)),
        }
    }

    fn fork(self, device: &B::Device) -> Self {
        match self {
            Self::Conv(module) => Self::Conv(Module::<B>::fork(module, device)),
            Self::Act(module) => Self::Act(Module::<B>::fork(module, device)),
            Self::Pad(module) => Self::Pad(Module::<B>::fork(module, device)),
            Self::Norm(module) => Self::Norm(Module::<B>::fork(module, device)),
            Self::Upsample(module) => Self::Upsample(Module::<B>::fork(module, device)),
            Self::Residual(module) => Self::Residual(Module::<B>::fork(module, device)),
            Self::Shortcut(module) => Self::Shortcut(Module::<B>::fork(module, device)),
        }
    }
}

impl<B: AutodiffBackend> AutodiffModule<B> for Layer<B> {
    type InnerModule = Layer<B::InnerBackend>;

    fn valid(&self) -> Self::InnerModule {
        match self {
            Self::Conv(module) => Layer::Conv(AutodiffModule::<B>::valid(module)),
            Self::Act(module) => Layer::Act(AutodiffModule::<B>::valid(module)),
            Self::Pad(module) => Layer::Pad(AutodiffModule::<B>::valid(module)),
            Self::Norm(module) => Layer::Norm(AutodiffModule::<B>::valid(module)),
            Self::Upsample(module) => Layer::Upsample(AutodiffModule::<B>::valid(module)),
            Self::Residual(module) => Layer::Residual(AutodiffModule::<B>::valid(module)),
            Self::Shortcut(module) => Layer::Shortcut(AutodiffModule::<B>::valid(module)),
        }
    }
}

impl<B: Backend> Clone for Layer<B> {
    fn clone(&self) -> Self {
        match self {
            Self::Conv(module) => Self::Conv(module.clone()),
            Self::Act(module) => Self::Act(module.clone()),
            Self::Pad(module) => Self::Pad(module.clone()),
            Self::Norm(module) => Self::Norm(module.clone()),
            Self::Upsample(module) => Self::Upsample(module.clone()),
            Self::Residual(module) => Self::Residual(module.clone()),
            Self::Shortcut(module) => Self::Shortcut(module.clone()),
        }
    }
}

impl<B: Backend> core::fmt::Display for Layer<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let formatted = ModuleDisplay::format(self, Default::default());
        write!(f, "{}", formatted)
    }
}

impl<B: Backend> ModuleDisplayDefault for Layer<B> {
    fn content(&self, content: Content) -> Option<Content> {
        match self {
            Self::Conv(_0) => content.set_top_level_type("Conv").add("_0", _0).optional(),
            Self::Act(_0) => content.set_top_level_type("Act").add("_0", _0).optional(),
            Self::Pad(_0) => content.set_top_level_type("Pad").add("_0", _0).optional(),
            Self::Norm(_0) => content.set_top_level_type("Norm").add("_0", _0).optional(),
            Self::Upsample(_0) => content
                .set_top_level_type("Upsample")
                .add("_0", _0)
                .optional(),
            Self::Residual(_0) => content
                .set_top_level_type("Residual")
                .add("_0", _0)
                .optional(),
            Self::Shortcut(_0) => content
                .set_top_level_type("Shortcut")
                .add("_0", _0)
                .optional(),
        }
    }

    fn num_params(&self) -> usize {
        Module::<B>::num_params(self)
    }
}

impl<B: Backend> ModuleDisplay for Layer<B> {}

/// The record type for [`Sequential`].
pub struct SequentialRecord<B: Backend> {
    /// The module record associative type.
    pub layers: <Vec<Layer<B>> as Module<B>>::Record,
}

/// The record item type for [`Sequential`].
#[derive(burn::serde::Serialize, burn::serde::Deserialize)]
#[serde(crate = "burn::serde")]
#[serde(bound = "")]
pub struct SequentialRecordItem<B: Backend, S: PrecisionSettings> {
    /// Field to be serialized.
    pub layers: <<Vec<Layer<B>> as Module<B>>::Record as Record<B>>::Item<S>,
}

impl<B: Backend> Record<B> for SequentialRecord<B> {
    type Item<S: PrecisionSettings> = SequentialRecordItem<B, S>;

    fn into_item<S: PrecisionSettings>(self) -> Self::Item<S> {
        SequentialRecordItem {
            layers: Record::<B>::into_item::<S>(self.layers),
        }
    }

    fn from_item<S: PrecisionSettings>(item: Self::Item<S>, device: &B::Device) -> Self {
        Self {
            layers: Record::<B>::from_item::<S>(item.layers, device),
        }
    }
}

impl<B: Backend> Module<B> for Sequential<B> {
    type Record = SequentialRecord<B>;

    fn load_record(self, record: Self::Record) -> Self {
        Self {
            layers: Module::<B>::load_record(self.layers, record.layers),
        }
    }

    fn into_record(self) -> Self::Record {
        Self::Record {
            layers: Module::<B>::into_record(self.layers),
        }
    }

    fn num_params(&self) -> usize {
        let mut num_params = 0;
        num_params += Module::<B>::num_params(&self.layers);
        num_params
    }

    fn visit<Visitor: ModuleVisitor<B>>(&self, visitor: &mut Visitor) {
        Module::visit(&self.layers, visitor);
    }

    fn map<Mapper: ModuleMapper<B>>(self, mapper: &mut Mapper) -> Self {
        let layers = Module::<B>::map(self.layers, mapper);
        Self { layers }
    }

    fn collect_devices(&self, devices: Devices<B>) -> Devices<B> {
        let devices = Module::<B>::collect_devices(&self.layers, devices);
        devices
    }

    fn to_device(self, device: &B::Device) -> Self {
        let layers = Module::<B>::to_device(self.layers, device);
        Self { layers }
    }

    fn fork(self, device: &B::Device) -> Self {
        let layers = Module::<B>::fork(self.layers, device);
        Self { layers }
    }
}

impl<B: AutodiffBackend> AutodiffModule<B> for Sequential<B> {
    type InnerModule = Sequential<B::InnerBackend>;

    fn valid(&self) -> Self::InnerModule {
        let layers = AutodiffModule::<B>::valid(&self.layers);
        Self::InnerModule { layers }
    }
}

impl<B: Backend> Clone for Sequential<B> {
    fn clone(&self) -> Self {
        let layers = self.layers.clone();
        Self { layers }
    }
}

impl<B: Backend> core::fmt::Display for Sequential<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let formatted = ModuleDisplay::format(self, Default::default());
        write!(f, "{}", formatted)
    }
}

impl<B: Backend> ModuleDisplayDefault for Sequential<B> {
    fn content(&self, content: Content) -> Option<Content> {
        content
            .set_top_level_type("Sequential")
            .add("layers", &self.layers)
            .optional()
    }

    fn num_params(&self) -> usize {
        Module::<B>::num_params(self)
    }
}

impl<B: Backend> ModuleDisplay for Sequential<B> {}

/// The record type for [`ShortcutBlock`].
pub struct ShortcutBlockRecord<B: Backend> {
    /// The module record associative type.
    pub inner: <Sequential<B> as Module<B>>::Record,
}

/// The record item type for [`ShortcutBlock`].
#[derive(burn::serde::Serialize, burn::serde::Deserialize)]
#[serde(crate = "burn::serde")]
#[serde(bound = "")]
pub struct ShortcutBlockRecordItem<B: Backend, S: PrecisionSettings> {
    /// Field to be serialized.
    pub inner: <<Sequential<B> as Module<B>>::Record as Record<B>>::Item<S>,
}

impl<B: Backend> Record<B> for ShortcutBlockRecord<B> {
    type Item<S: PrecisionSettings> = ShortcutBlockRecordItem<B, S>;

    fn into_item<S: PrecisionSettings>(self) -> Self::Item<S> {
        ShortcutBlockRecordItem {
            inner: Record::<B>::into_item::<S>(self.inner),
        }
    }

    fn from_item<S: PrecisionSettings>(item: Self::Item<S>, device: &B::Device) -> Self {
        Self {
            inner: Record::<B>::from_item::<S>(item.inner, device),
        }
    }
}

impl<B: Backend> Module<B> for ShortcutBlock<B> {
    type Record = ShortcutBlockRecord<B>;

    fn load_record(self, record: Self::Record) -> Self {
        Self {
            inner: Module::<B>::load_record(self.inner, record.inner),
        }
    }

    fn into_record(self) -> Self::Record {
        Self::Record {
            inner: Module::<B>::into_record(self.inner),
        }
    }

    fn num_params(&self) -> usize {
        let mut num_params = 0;
        num_params += Module::<B>::num_params(&self.inner);
        num_params
    }

    fn visit<Visitor: ModuleVisitor<B>>(&self, visitor: &mut Visitor) {
        Module::visit(&self.inner, visitor);
    }

    fn map<Mapper: ModuleMapper<B>>(self, mapper: &mut Mapper) -> Self {
        let inner = Module::<B>::map(self.inner, mapper);
        Self { inner }
    }

    fn collect_devices(&self, devices: Devices<B>) -> Devices<B> {
        let devices = Module::<B>::collect_devices(&self.inner, devices);
        devices
    }

    fn to_device(self, device: &B::Device) -> Self {
        let inner = Module::<B>::to_device(self.inner, device);
        Self { inner }
    }

    fn fork(self, device: &B::Device) -> Self {
        let inner = Module::<B>::fork(self.inner, device);
        Self { inner }
    }
}

impl<B: AutodiffBackend> AutodiffModule<B> for ShortcutBlock<B> {
    type InnerModule = ShortcutBlock<B::InnerBackend>;

    fn valid(&self) -> Self::InnerModule {
        let inner = AutodiffModule::<B>::valid(&self.inner);
        Self::InnerModule { inner }
    }
}

impl<B: Backend> Clone for ShortcutBlock<B> {
    fn clone(&self) -> Self {
        let inner = self.inner.clone();
        Self { inner }
    }
}

impl<B: Backend> core::fmt::Display for ShortcutBlock<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let formatted = ModuleDisplay::format(self, Default::default());
        write!(f, "{}", formatted)
    }
}

impl<B: Backend> ModuleDisplayDefault for ShortcutBlock<B> {
    fn content(&self, content: Content) -> Option<Content> {
        content
            .set_top_level_type("ShortcutBlock")
            .add("inner", &self.inner)
            .optional()
    }

    fn num_params(&self) -> usize {
        Module::<B>::num_params(self)
    }
}

impl<B: Backend> ModuleDisplay for ShortcutBlock<B> {}
