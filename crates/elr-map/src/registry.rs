//! Mapper registry.
//!
//! Schemas name mappers by string. The registry resolves those names once,
//! when a schema is compiled, so mapping a record never dispatches on text.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::livd::LivdLookupMapper;
use crate::mapper::Mapper;
use crate::mappers::{
    CoalesceMapper, ConcatenateMapper, CountryMapper, DateTimeOffsetMapper, HashMapper,
    IfNotPresentMapper, IfNpiMapper, IfPresentMapper, IfThenElseMapper, LookupMapper,
    LookupSenderAutomationValuesetsMapper, MiddleInitialMapper, NpiLookupMapper, NullMapper,
    Obx8Mapper, Obx17Mapper, Obx17TypeMapper, PatientAgeMapper, SplitByCommaMapper, SplitMapper,
    StripNonNumericMapper, StripNumericMapper, StripPhoneFormattingMapper, TimestampMapper,
    TrimBlanksMapper, UseMapper, UseSenderSettingMapper, ZipCodeToCountyMapper,
    ZipCodeToStateMapper,
};

/// Mappers indexed by the name used in schema mapper fields.
///
/// Names are matched exactly. The registry is immutable once built and can
/// be shared across threads.
#[derive(Default)]
pub struct MapperRegistry {
    mappers: HashMap<&'static str, Box<dyn Mapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapper under its name, replacing any mapper of that name.
    pub fn register(&mut self, mapper: Box<dyn Mapper>) {
        self.mappers.insert(mapper.name(), mapper);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Mapper> {
        self.mappers.get(name).map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.mappers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

static DEFAULT_REGISTRY: OnceLock<MapperRegistry> = OnceLock::new();

/// The registry of every built-in mapper, built on first use.
pub fn default_registry() -> &'static MapperRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> MapperRegistry {
    let mut registry = MapperRegistry::new();

    registry.register(Box::new(MiddleInitialMapper));
    registry.register(Box::new(UseMapper));
    registry.register(Box::new(UseSenderSettingMapper));
    registry.register(Box::new(ConcatenateMapper));
    registry.register(Box::new(IfThenElseMapper));
    registry.register(Box::new(IfPresentMapper));
    registry.register(Box::new(IfNotPresentMapper));
    registry.register(Box::new(IfNpiMapper));
    registry.register(Box::new(LookupMapper));
    registry.register(Box::new(LookupSenderAutomationValuesetsMapper));
    registry.register(Box::new(NpiLookupMapper));
    registry.register(Box::new(LivdLookupMapper));
    registry.register(Box::new(Obx8Mapper));
    registry.register(Box::new(Obx17Mapper));
    registry.register(Box::new(Obx17TypeMapper));
    registry.register(Box::new(TimestampMapper));
    registry.register(Box::new(DateTimeOffsetMapper));
    registry.register(Box::new(CoalesceMapper));
    registry.register(Box::new(TrimBlanksMapper));
    registry.register(Box::new(StripPhoneFormattingMapper));
    registry.register(Box::new(StripNonNumericMapper));
    registry.register(Box::new(StripNumericMapper));
    registry.register(Box::new(SplitMapper));
    registry.register(Box::new(SplitByCommaMapper));
    registry.register(Box::new(ZipCodeToCountyMapper));
    registry.register(Box::new(ZipCodeToStateMapper));
    registry.register(Box::new(CountryMapper));
    registry.register(Box::new(PatientAgeMapper));
    registry.register(Box::new(HashMapper));
    registry.register(Box::new(NullMapper));

    registry
}
