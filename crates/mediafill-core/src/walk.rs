//! Tree walker
//!
//! Two synchronous passes driven by a [`TypeDescriptor`]:
//!
//! - [`CollectPass`] builds the destination from the source and records every
//!   media identifier it copies
//! - [`FillPass`] substitutes resolved URLs into the populated destination
//!
//! Neither pass fails: shape mismatches leave the destination default.
//! Nested record links are resolved through the [`DescriptorCache`] once per
//! pass, so recursive records are walked as deep as the data goes.

use crate::cache::DescriptorCache;
use crate::collector::IdentifierCollector;
use crate::descriptor::{RecordLink, ShapePair, TypeDescriptor, ValuePlan};
use crate::markup::MarkupScanner;
use crate::reflect::{
    assign, deref_value, text_of, RecordValue, Reflect, ScalarSlot, ValueMut, ValueRef,
};
use crate::resolver::{ResolutionMap, ResolutionRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Allocate every absent level of indirection in `dst`
pub(crate) fn allocate(dst: &mut dyn Reflect) {
    if let ValueMut::Indirect(slot) = dst.value_mut() {
        allocate(slot.get_or_insert_default());
    }
}

/// Copy `text` into a text-backed slot, returning whether it was stored
fn copy_text(slot: &mut dyn ScalarSlot, text: &str) -> bool {
    match slot.text_mut() {
        Some(buffer) => {
            text.clone_into(buffer);
            true
        }
        None => false,
    }
}

/// Descriptors for the record links met during one pass
struct LinkedPlans<'a> {
    cache: &'a DescriptorCache,
    resolved: HashMap<ShapePair, Arc<TypeDescriptor>>,
}

impl<'a> LinkedPlans<'a> {
    fn new(cache: &'a DescriptorCache) -> Self {
        Self {
            cache,
            resolved: HashMap::new(),
        }
    }

    fn get(&mut self, link: &RecordLink) -> Arc<TypeDescriptor> {
        let cache = self.cache;
        let descriptor = self
            .resolved
            .entry(link.pair())
            .or_insert_with(|| cache.linked(link));
        Arc::clone(descriptor)
    }
}

/// Map-and-collect pass
pub(crate) struct CollectPass<'a> {
    scanner: &'a MarkupScanner,
    plans: LinkedPlans<'a>,
    ids: IdentifierCollector,
}

impl<'a> CollectPass<'a> {
    pub(crate) fn new(scanner: &'a MarkupScanner, cache: &'a DescriptorCache) -> Self {
        Self {
            scanner,
            plans: LinkedPlans::new(cache),
            ids: IdentifierCollector::new(),
        }
    }

    pub(crate) fn into_ids(self) -> IdentifierCollector {
        self.ids
    }

    /// Populate `dst` from `src` following `plan`
    ///
    /// An absent source leaves `dst` untouched. An absent destination
    /// indirection is allocated once the source is known to be present.
    pub(crate) fn value(&mut self, src: &dyn Reflect, dst: &mut dyn Reflect, plan: &ValuePlan) {
        let Some(src) = deref_value(src) else {
            return;
        };
        if matches!(plan, ValuePlan::Scalar) {
            assign(dst, src);
            return;
        }
        match dst.value_mut() {
            ValueMut::Indirect(slot) => self.value(src, slot.get_or_insert_default(), plan),
            view => self.direct(src, view, plan),
        }
    }

    fn direct(&mut self, src: &dyn Reflect, dst: ValueMut<'_>, plan: &ValuePlan) {
        match (plan, dst) {
            (ValuePlan::SingleReference, ValueMut::Scalar(slot)) => {
                let id = text_of(src).unwrap_or_default();
                if copy_text(slot, id) {
                    self.ids.add(id);
                }
            }
            (ValuePlan::ReferenceList, ValueMut::Sequence(target)) => {
                let ValueRef::Sequence(items) = src.value() else {
                    return;
                };
                target.reset(items.len());
                for index in 0..items.len() {
                    let id = items.get(index).and_then(text_of).unwrap_or_default();
                    let Some(element) = target.get_mut(index) else {
                        continue;
                    };
                    if let ValueMut::Scalar(slot) = element.value_mut() {
                        if copy_text(slot, id) {
                            self.ids.add(id);
                        }
                    }
                }
            }
            (ValuePlan::RichMarkup, ValueMut::Scalar(slot)) => {
                let text = text_of(src).unwrap_or_default();
                if copy_text(slot, text) {
                    self.ids.extend(self.scanner.identifiers(text));
                }
            }
            (ValuePlan::Sequence(element), ValueMut::Sequence(target)) => {
                let ValueRef::Sequence(items) = src.value() else {
                    return;
                };
                if items.is_empty() {
                    return;
                }
                target.reset(items.len());
                for index in 0..items.len() {
                    let Some(slot) = target.get_mut(index) else {
                        continue;
                    };
                    if matches!(**element, ValuePlan::NestedRecord(_)) {
                        allocate(slot);
                    }
                    if let Some(item) = items.get(index) {
                        self.value(item, slot, element);
                    }
                }
            }
            (ValuePlan::KeyedMapping { value, .. }, ValueMut::Mapping(target)) => {
                let ValueRef::Mapping(entries) = src.value() else {
                    return;
                };
                if entries.is_empty() {
                    return;
                }
                target.clear();
                for (key, item) in entries.entries() {
                    let Some(slot) = target.insert_default(key) else {
                        tracing::trace!("mapping key not representable or already present, entry skipped");
                        continue;
                    };
                    if matches!(**value, ValuePlan::NestedRecord(_)) {
                        allocate(slot);
                    }
                    self.value(item, slot, value);
                }
            }
            (ValuePlan::NestedRecord(link), ValueMut::Record(target)) => {
                if let ValueRef::Record(source) = src.value() {
                    let descriptor = self.plans.get(link);
                    self.fields(source, target, &descriptor);
                }
            }
            _ => {}
        }
    }

    /// Walk every matched field of a record pair
    pub(crate) fn fields(
        &mut self,
        source: &dyn RecordValue,
        target: &mut dyn RecordValue,
        descriptor: &TypeDescriptor,
    ) {
        for field in descriptor.fields() {
            let (Some(src), Some(dst)) = (
                source.field(field.source_index),
                target.field_mut(field.destination_index),
            ) else {
                continue;
            };
            self.value(src, dst, &field.plan);
        }
    }
}

/// URL substitution pass
pub(crate) struct FillPass<'a> {
    scanner: &'a MarkupScanner,
    plans: LinkedPlans<'a>,
    resolutions: &'a ResolutionMap,
}

impl<'a> FillPass<'a> {
    pub(crate) fn new(
        scanner: &'a MarkupScanner,
        cache: &'a DescriptorCache,
        resolutions: &'a ResolutionMap,
    ) -> Self {
        Self {
            scanner,
            plans: LinkedPlans::new(cache),
            resolutions,
        }
    }

    /// Substitute resolved URLs inside `dst` following `plan`
    ///
    /// Absent destination indirections are skipped, never allocated.
    pub(crate) fn value(&mut self, dst: &mut dyn Reflect, plan: &ValuePlan) {
        if matches!(plan, ValuePlan::Scalar) {
            return;
        }
        match dst.value_mut() {
            ValueMut::Indirect(slot) => {
                if let Some(inner) = slot.get_mut() {
                    self.value(inner, plan);
                }
            }
            view => self.direct(view, plan),
        }
    }

    fn direct(&mut self, dst: ValueMut<'_>, plan: &ValuePlan) {
        match (plan, dst) {
            (ValuePlan::SingleReference, ValueMut::Scalar(slot)) => {
                if let Some(buffer) = slot.text_mut() {
                    self.substitute(buffer);
                }
            }
            (ValuePlan::ReferenceList, ValueMut::Sequence(target)) => {
                for index in 0..target.len() {
                    if let Some(element) = target.get_mut(index) {
                        self.value(element, &ValuePlan::SingleReference);
                    }
                }
            }
            (ValuePlan::RichMarkup, ValueMut::Scalar(slot)) => {
                if let Some(buffer) = slot.text_mut() {
                    self.rewrite(buffer);
                }
            }
            (ValuePlan::Sequence(element), ValueMut::Sequence(target)) => {
                for index in 0..target.len() {
                    if let Some(slot) = target.get_mut(index) {
                        self.value(slot, element);
                    }
                }
            }
            (ValuePlan::KeyedMapping { value, .. }, ValueMut::Mapping(target)) => {
                for slot in target.values_mut() {
                    self.value(slot, value);
                }
            }
            (ValuePlan::NestedRecord(link), ValueMut::Record(target)) => {
                let descriptor = self.plans.get(link);
                self.fields(target, &descriptor);
            }
            _ => {}
        }
    }

    /// Substitute inside every matched field of a destination record
    pub(crate) fn fields(&mut self, target: &mut dyn RecordValue, descriptor: &TypeDescriptor) {
        for field in descriptor.fields() {
            if let Some(dst) = target.field_mut(field.destination_index) {
                self.value(dst, &field.plan);
            }
        }
    }

    fn substitute(&self, buffer: &mut String) {
        let resolved = self
            .resolutions
            .get(buffer.as_str())
            .and_then(ResolutionRecord::url);
        if let Some(url) = resolved {
            url.clone_into(buffer);
        }
    }

    fn rewrite(&self, buffer: &mut String) {
        let rewritten = match self.scanner.rewrite(buffer, self.resolutions) {
            std::borrow::Cow::Owned(text) => text,
            std::borrow::Cow::Borrowed(_) => return,
        };
        *buffer = rewritten;
    }
}
