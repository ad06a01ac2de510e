//! Mask layers and their manager.
//!
//! A layer owns its own [`Settings`] and an ordered list of mask
//! operations. Layers are stored top first: new layers are inserted at
//! index 0, and compositing walks the list in stored order.

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::mask::{MaskTool, MaskToolKind};
use crate::settings::Settings;

pub type LayerId = u32;
pub type OperationId = u32;

pub const DEFAULT_STRENGTH: f32 = 100.0;
pub const MAX_STRENGTH: f32 = 200.0;

/// RGBA tint used to preview a layer's mask.
pub const DEFAULT_OVERLAY_COLOR: [u8; 4] = [255, 0, 0, 100];

// ============================================================================
// Mask Operations
// ============================================================================

/// How an operation's mask combines with the ones before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanMode {
    /// Union (source-over).
    #[default]
    Add,
    /// Difference (destination-out).
    Subtract,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskOperation {
    pub id: OperationId,
    pub mode: BooleanMode,
    pub tool: MaskTool,
}

impl MaskOperation {
    pub fn kind(&self) -> MaskToolKind {
        self.tool.kind()
    }

    pub fn to_record(&self) -> Result<MaskOperationRecord, EditError> {
        Ok(MaskOperationRecord {
            id: self.id,
            mode: self.mode,
            kind: self.kind(),
            blob: self.tool.to_blob()?,
        })
    }

    pub fn from_record(record: &MaskOperationRecord) -> Result<Self, EditError> {
        let tool = match &record.blob {
            Some(blob) => MaskTool::from_blob(record.kind, blob)?,
            None => MaskTool::new(record.kind),
        };
        Ok(Self {
            id: record.id,
            mode: record.mode,
            tool,
        })
    }
}

/// Persisted form of a mask operation: geometry is flattened to a blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskOperationRecord {
    pub id: OperationId,
    pub mode: BooleanMode,
    pub kind: MaskToolKind,
    pub blob: Option<String>,
}

// ============================================================================
// Layer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub invert: bool,
    /// Percent in [0, 200].
    pub strength: f32,
    pub overlay_color: [u8; 4],
    pub settings: Settings,
    pub operations: Vec<MaskOperation>,
    pub selected_operation: Option<OperationId>,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            invert: false,
            strength: DEFAULT_STRENGTH,
            overlay_color: DEFAULT_OVERLAY_COLOR,
            settings: Settings::default_image(),
            operations: Vec::new(),
            selected_operation: None,
        }
    }

    /// True when the layer's settings would change an image.
    pub fn has_active_filters(&self) -> bool {
        !self.settings.is_neutral()
    }

    pub fn operation(&self, id: OperationId) -> Option<&MaskOperation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn operation_mut(&mut self, id: OperationId) -> Option<&mut MaskOperation> {
        self.operations.iter_mut().find(|op| op.id == id)
    }

    pub fn to_record(&self) -> Result<LayerRecord, EditError> {
        Ok(LayerRecord {
            id: self.id,
            name: self.name.clone(),
            visible: self.visible,
            invert: self.invert,
            strength: self.strength,
            overlay_color: self.overlay_color,
            settings: self.settings.to_json()?,
            operations: self
                .operations
                .iter()
                .map(MaskOperation::to_record)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn from_record(record: &LayerRecord) -> Result<Self, EditError> {
        let operations: Vec<MaskOperation> = record
            .operations
            .iter()
            .map(MaskOperation::from_record)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            visible: record.visible,
            invert: record.invert,
            strength: record.strength.clamp(0.0, MAX_STRENGTH),
            overlay_color: record.overlay_color,
            settings: Settings::from_json(&record.settings)?,
            selected_operation: operations.first().map(|op| op.id),
            operations,
        })
    }
}

/// Persisted form of a layer. Settings use the JSON settings codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub invert: bool,
    pub strength: f32,
    pub overlay_color: [u8; 4],
    pub settings: String,
    pub operations: Vec<MaskOperationRecord>,
}

// ============================================================================
// Layer Manager
// ============================================================================

/// Ordered layer list with selection and id allocation.
///
/// Cloning produces a deep copy, so a clone is a valid undo snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerManager {
    layers: Vec<Layer>,
    selected: Option<LayerId>,
    next_layer_id: LayerId,
    next_operation_id: OperationId,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            selected: None,
            next_layer_id: 1,
            next_operation_id: 1,
        }
    }
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Layer> {
        let id = self.selected?;
        self.get_mut(id)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn layer_by_operation(&self, operation: OperationId) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.operations.iter().any(|op| op.id == operation))
    }

    /// Add a layer on top, seeded with one operation of `kind`, and select it.
    pub fn add_layer(&mut self, kind: MaskToolKind) -> LayerId {
        let id = self.next_layer_id;
        self.next_layer_id += 1;

        let mut layer = Layer::new(id, format!("Layer {}", self.layers.len() + 1));
        let op_id = self.allocate_operation_id();
        layer.operations.push(MaskOperation {
            id: op_id,
            mode: BooleanMode::Add,
            tool: MaskTool::new(kind),
        });
        layer.selected_operation = Some(op_id);

        self.layers.insert(0, layer);
        self.selected = Some(id);
        tracing::debug!(layer = id, ?kind, "added layer");
        id
    }

    /// Remove a layer. If it was selected, selection moves to the layer now
    /// at its index (or the new last layer).
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.layers.iter().position(|l| l.id == id)?;
        let removed = self.layers.remove(index);

        if self.selected == Some(id) {
            self.selected = if self.layers.is_empty() {
                None
            } else {
                Some(self.layers[index.min(self.layers.len() - 1)].id)
            };
        }
        tracing::debug!(layer = id, "removed layer");
        Some(removed)
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        match id {
            Some(id) if self.get(id).is_none() => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> bool {
        self.get_mut(id).map(|l| l.visible = visible).is_some()
    }

    pub fn set_invert(&mut self, id: LayerId, invert: bool) -> bool {
        self.get_mut(id).map(|l| l.invert = invert).is_some()
    }

    /// Set strength in percent, clamped to [0, 200].
    pub fn set_strength(&mut self, id: LayerId, strength: f32) -> bool {
        let strength = if strength.is_nan() {
            DEFAULT_STRENGTH
        } else {
            strength.clamp(0.0, MAX_STRENGTH)
        };
        self.get_mut(id).map(|l| l.strength = strength).is_some()
    }

    /// Append an operation to a layer and select it.
    pub fn add_operation(
        &mut self,
        layer: LayerId,
        mode: BooleanMode,
        tool: MaskTool,
    ) -> Option<OperationId> {
        if self.get(layer).is_none() {
            return None;
        }
        let op_id = self.allocate_operation_id();
        let target = self.get_mut(layer)?;
        target.operations.push(MaskOperation {
            id: op_id,
            mode,
            tool,
        });
        target.selected_operation = Some(op_id);
        Some(op_id)
    }

    /// Remove an operation. Removing a layer's last operation removes the layer.
    pub fn remove_operation(&mut self, operation: OperationId) -> bool {
        let Some(layer_id) = self.layer_by_operation(operation).map(|l| l.id) else {
            return false;
        };
        let Some(layer) = self.get_mut(layer_id) else {
            return false;
        };
        if layer.operations.len() == 1 {
            self.remove_layer(layer_id);
            return true;
        }
        layer.operations.retain(|op| op.id != operation);
        if layer.selected_operation == Some(operation) {
            layer.selected_operation = None;
        }
        true
    }

    /// Drop every layer with no operations.
    pub fn prune_empty(&mut self) {
        let empty: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|l| l.operations.is_empty())
            .map(|l| l.id)
            .collect();
        for id in empty {
            self.remove_layer(id);
        }
    }

    /// Attach every tool to a display surface.
    pub fn resize_tools(&mut self, width: u32, height: u32) {
        for op in self.layers.iter_mut().flat_map(|l| l.operations.iter_mut()) {
            op.tool.resize(width, height);
        }
    }

    fn allocate_operation_id(&mut self) -> OperationId {
        let id = self.next_operation_id;
        self.next_operation_id += 1;
        id
    }

    pub fn to_records(&self) -> Result<Vec<LayerRecord>, EditError> {
        self.layers.iter().map(Layer::to_record).collect()
    }

    /// Rebuild from records; ids continue after the largest one seen.
    pub fn from_records(records: &[LayerRecord]) -> Result<Self, EditError> {
        let layers: Vec<Layer> = records
            .iter()
            .map(Layer::from_record)
            .collect::<Result<_, _>>()?;

        let next_layer_id = layers.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        let next_operation_id = layers
            .iter()
            .flat_map(|l| l.operations.iter().map(|op| op.id))
            .max()
            .unwrap_or(0)
            + 1;

        let mut manager = Self {
            selected: layers.first().map(|l| l.id),
            layers,
            next_layer_id,
            next_operation_id,
        };
        manager.prune_empty();
        Ok(manager)
    }
}
