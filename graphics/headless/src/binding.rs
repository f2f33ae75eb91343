use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracereplay_core::gpu::{BindingTable, Buffer, ViewConstants};

use crate::rt::AccelerationStructureInner;
use crate::{HeadlessBackend, HeadlessEvent, HeadlessShared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredBufferBinding {
    pub va: u64,
    pub element_count: u32,
    pub stride: u32,
}

#[derive(Default)]
struct BindingTableState {
    acceleration_structures: HashMap<u32, Arc<AccelerationStructureInner>>,
    buffers: HashMap<u32, StructuredBufferBinding>,
    view_constants: Option<ViewConstants>,
}

pub struct HeadlessBindingTable {
    state: Mutex<BindingTableState>,
    shared: Arc<HeadlessShared>,
}

impl HeadlessBindingTable {
    pub(crate) fn new(shared: &Arc<HeadlessShared>) -> Self {
        Self {
            state: Mutex::new(BindingTableState::default()),
            shared: shared.clone(),
        }
    }

    pub fn acceleration_structure(&self, slot: u32) -> Option<u64> {
        self.state.lock().acceleration_structures.get(&slot).map(|a| a.va())
    }

    pub fn structured_buffer(&self, slot: u32) -> Option<StructuredBufferBinding> {
        self.state.lock().buffers.get(&slot).copied()
    }

    pub fn view_constants(&self) -> Option<ViewConstants> {
        self.state.lock().view_constants
    }

    pub(crate) fn bound_acceleration_structures_built(&self) -> bool {
        let state = self.state.lock();
        !state.acceleration_structures.is_empty() && state.acceleration_structures.values().all(|a| a.is_built())
    }
}

impl BindingTable<HeadlessBackend> for HeadlessBindingTable {
    unsafe fn bind_acceleration_structure(&self, slot: u32, acceleration_structure: &crate::HeadlessAccelerationStructure) {
        let inner = acceleration_structure.inner().clone();
        let va = inner.va();
        self.state.lock().acceleration_structures.insert(slot, inner);
        self.shared.record(HeadlessEvent::AccelerationStructureBound { slot, va });
    }

    unsafe fn bind_structured_buffer(&self, slot: u32, buffer: &crate::HeadlessBuffer, offset: u64, element_count: u32, stride: u32) {
        assert!(offset + element_count as u64 * stride as u64 <= buffer.info().size);
        self.state.lock().buffers.insert(slot, StructuredBufferBinding {
            va: buffer.va() + offset,
            element_count,
            stride,
        });
        self.shared.record(HeadlessEvent::StructuredBufferBound { slot, element_count, stride });
    }

    unsafe fn set_view_constants(&self, constants: &ViewConstants) {
        self.state.lock().view_constants = Some(*constants);
        self.shared.record(HeadlessEvent::ViewConstantsSet);
    }
}
