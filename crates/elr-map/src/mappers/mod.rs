//! Built-in mappers, grouped by what they consult.

pub mod basic;
pub mod conditional;
pub mod dates;
pub mod lookup;
pub mod obx;
pub mod text;

pub use basic::{
    CoalesceMapper, ConcatenateMapper, HashMapper, MiddleInitialMapper, NullMapper,
    TimestampMapper, TrimBlanksMapper, UseMapper, UseSenderSettingMapper,
};
pub use conditional::{IfNotPresentMapper, IfNpiMapper, IfPresentMapper, IfThenElseMapper};
pub use dates::{DateTimeOffsetMapper, PatientAgeMapper};
pub use lookup::{
    LookupMapper, LookupSenderAutomationValuesetsMapper, NpiLookupMapper, ZipCodeToCountyMapper,
    ZipCodeToStateMapper,
};
pub use obx::{Obx8Mapper, Obx17Mapper, Obx17TypeMapper};
pub use text::{
    CountryMapper, SplitByCommaMapper, SplitMapper, StripNonNumericMapper, StripNumericMapper,
    StripPhoneFormattingMapper,
};
