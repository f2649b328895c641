//! Name-keyed register map of a device.
//!
//! Fields are declared once while a device model is built. Redeclaring a name
//! replaces the earlier declaration in place: iteration keeps the original
//! position, decoding only uses the newest location.

use crate::{
    commands::QueryRangeCommand,
    error::{DecodeError, DeclarationError},
    fields::{Address, FieldKind, FieldValue, Page, SymbolSet},
};
use indexmap::IndexMap;
use log::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub page: Page,
    pub address: Address,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn registers(&self) -> u16 {
        self.kind.registers()
    }

    /// Exclusive end register.
    pub fn end(&self) -> u32 {
        self.address as u32 + self.registers() as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceStruct {
    fields: IndexMap<String, FieldSpec>,
}

/// Values and per-field failures of one or more decode passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    pub values: IndexMap<String, FieldValue>,
    pub errors: Vec<DecodeError>,
}

impl DecodeOutcome {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Folds `other` into `self`; values from `other` win on name clashes.
    pub fn merge(&mut self, other: DecodeOutcome) {
        self.values.extend(other.values);
        self.errors.extend(other.errors);
    }
}

impl DeviceStruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field, replacing any earlier field of the same name.
    ///
    /// Overlap with other fields is not checked.
    pub fn try_add_field<S: Into<String>>(
        &mut self,
        name: S,
        page: Page,
        address: Address,
        kind: FieldKind,
    ) -> Result<&mut Self, DeclarationError> {
        let name = name.into();

        if address as u32 + kind.registers() as u32 > Address::MAX as u32 + 1 {
            return Err(DeclarationError::AddressOverflow { field: name, address });
        }

        let spec = FieldSpec {
            name: name.clone(),
            page,
            address,
            kind,
        };

        if let Some(previous) = self.fields.insert(name, spec) {
            trace!(
                "field {:?} moved from page {:#04x} register {:#04x} to page {page:#04x} register {address:#04x}",
                previous.name,
                previous.page,
                previous.address
            );
        }

        Ok(self)
    }

    /// # Panics
    ///
    /// On an invalid declaration (see [`DeclarationError`]).
    pub fn add_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address, kind: FieldKind) -> &mut Self {
        self.declare(name, page, address, Ok(kind))
    }

    fn declare<S: Into<String>>(
        &mut self,
        name: S,
        page: Page,
        address: Address,
        kind: Result<FieldKind, DeclarationError>,
    ) -> &mut Self {
        let name = name.into();

        match kind {
            Ok(kind) => match self.try_add_field(name, page, address, kind) {
                Ok(this) => this,
                Err(e) => panic!("invalid field declaration: {e}"),
            },
            Err(e) => panic!("invalid field declaration {name:?}: {e}"),
        }
    }

    pub fn add_string_field<S: Into<String>>(
        &mut self,
        name: S,
        page: Page,
        address: Address,
        registers: u16,
    ) -> &mut Self {
        self.declare(name, page, address, FieldKind::string(registers))
    }

    pub fn add_sn_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address) -> &mut Self {
        self.add_field(name, page, address, FieldKind::serial_number())
    }

    pub fn add_version_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address) -> &mut Self {
        self.add_field(name, page, address, FieldKind::VERSION)
    }

    pub fn add_uint_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address) -> &mut Self {
        self.add_field(name, page, address, FieldKind::UNSIGNED_INT)
    }

    pub fn add_bool_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address) -> &mut Self {
        self.add_field(name, page, address, FieldKind::BOOL)
    }

    pub fn add_decimal_field<S: Into<String>>(&mut self, name: S, page: Page, address: Address, scale: u8) -> &mut Self {
        self.declare(name, page, address, FieldKind::decimal(scale))
    }

    pub fn add_enum_field<E: SymbolSet, S: Into<String>>(&mut self, name: S, page: Page, address: Address) -> &mut Self {
        self.declare(name, page, address, FieldKind::enumeration::<E>())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields that `command` reads completely.
    pub fn fields_in<'a>(&'a self, command: &'a QueryRangeCommand) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields
            .values()
            .filter(move |f| command.covers(f.page, f.address, f.registers()))
    }

    /// Decodes every field inside the registers `raw` spans from `start`.
    ///
    /// An odd trailing byte counts as a partial register, so a field ending
    /// there is reported as truncated.
    pub fn decode(&self, page: Page, start: Address, raw: &[u8]) -> DecodeOutcome {
        let count = u16::try_from(raw.len().div_ceil(2)).unwrap_or(u16::MAX);
        self.decode_response(&QueryRangeCommand::new(page, start, count), raw)
    }

    /// Decodes the response to `command`.
    ///
    /// Fields inside the command range whose bytes are missing from `raw` are
    /// reported as [`DecodeError::TruncatedField`]; fields outside it are left out.
    /// [`DecodeError::UnmappedRange`] is reported only when no field touches the range.
    pub fn decode_response(&self, command: &QueryRangeCommand, raw: &[u8]) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::default();

        for field in self.fields_in(command) {
            let offset = (field.address - command.start()) as usize * 2;
            let end = (offset + field.registers() as usize * 2).min(raw.len());
            let bytes = raw.get(offset..end).unwrap_or_default();

            match field.kind.decode(&field.name, bytes) {
                Ok(value) => {
                    outcome.values.insert(field.name.clone(), value);
                },
                Err(e) => {
                    debug!("{command}: {e}");
                    outcome.errors.push(e);
                },
            }
        }

        let mapped = self
            .fields
            .values()
            .any(|f| f.page == command.page() && (f.address as u32) < command.end() && f.end() > command.start() as u32);

        if !mapped {
            outcome.errors.push(DecodeError::UnmappedRange {
                page: command.page(),
                start: command.start(),
                count: command.count(),
            });
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::protocol_enum! {
        enum Mode: "mode" {
            Standard = 0 => "STANDARD",
            Turbo = 2 => "TURBO",
        }
    }

    fn regs(words: &[u16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    /// Buffer for `count` registers from `start`, with `values` placed at absolute addresses.
    fn buffer(start: Address, count: u16, values: &[(Address, u16)]) -> Vec<u8> {
        let mut words = vec![0u16; count as usize];
        for &(address, value) in values {
            words[(address - start) as usize] = value;
        }
        regs(&words)
    }

    #[test]
    fn bool_field_in_wide_range() {
        let mut s = DeviceStruct::new();
        s.add_bool_field("dc_output_on", 0x00, 0x31);

        let raw = buffer(0x0A, 0x28, &[(0x31, 1)]);
        let outcome = s.decode(0x00, 0x0A, &raw);

        assert!(outcome.is_clean());
        assert_eq!(outcome.get("dc_output_on"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn decimal_field() {
        let mut s = DeviceStruct::new();
        s.add_decimal_field("ac_input_voltage", 0x00, 0x4D, 1);

        let outcome = s.decode(0x00, 0x4D, &regs(&[2300]));

        assert_eq!(outcome.get("ac_input_voltage").and_then(FieldValue::as_f64), Some(230.0));
    }

    #[test]
    fn every_kind_decodes_at_its_address() {
        let mut s = DeviceStruct::new();
        s.add_string_field("device_type", 0x00, 0x10, 2)
            .add_sn_field("serial_number", 0x00, 0x12)
            .add_version_field("arm_version", 0x00, 0x16)
            .add_uint_field("power", 0x00, 0x18)
            .add_bool_field("on", 0x00, 0x19)
            .add_decimal_field("voltage", 0x00, 0x1A, 2)
            .add_enum_field::<Mode, _>("mode", 0x00, 0x1B);

        let mut raw = b"EB".to_vec();
        raw.extend([0, 0]);
        raw.extend(regs(&[0x0002, 0x0001, 0, 0, 10203, 0, 640, 1, 1311, 2]));

        let outcome = s.decode(0x00, 0x10, &raw);

        assert!(outcome.is_clean(), "{:?}", outcome.errors);
        assert_eq!(outcome.get("device_type").and_then(FieldValue::as_str), Some("EB"));
        assert_eq!(outcome.get("serial_number"), Some(&FieldValue::SerialNumber(0x1_0002)));
        assert_eq!(outcome.get("arm_version").map(ToString::to_string).as_deref(), Some("102.03"));
        assert_eq!(outcome.get("power").and_then(FieldValue::as_u16), Some(640));
        assert_eq!(outcome.get("on").and_then(FieldValue::as_bool), Some(true));
        assert_eq!(outcome.get("voltage").and_then(FieldValue::as_f64), Some(13.11));
        assert_eq!(outcome.get("mode").and_then(FieldValue::as_enum::<Mode>), Some(Mode::Turbo));
        assert_eq!(
            outcome.values.keys().collect::<Vec<_>>(),
            ["device_type", "serial_number", "arm_version", "power", "on", "voltage", "mode"]
        );
    }

    #[test]
    fn decode_is_idempotent() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("a", 0x00, 0x00).add_enum_field::<Mode, _>("m", 0x00, 0x01);

        let raw = regs(&[5, 9]);

        assert_eq!(s.decode(0x00, 0x00, &raw), s.decode(0x00, 0x00, &raw));
    }

    #[test]
    fn redeclaration_uses_latest_location() {
        let mut s = DeviceStruct::new();
        s.add_bool_field("ac_output_on", 0x00, 0x30)
            .add_uint_field("load", 0x00, 0x31)
            .add_bool_field("ac_output_on", 0x0B, 0xBF);

        assert_eq!(s.len(), 2);
        assert_eq!(s.field("ac_output_on").map(|f| (f.page, f.address)), Some((0x0B, 0xBF)));
        assert_eq!(s.fields().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["ac_output_on", "load"]);

        let core = s.decode(0x00, 0x30, &regs(&[1, 7]));
        assert_eq!(core.get("ac_output_on"), None);
        assert_eq!(core.get("load"), Some(&FieldValue::UnsignedInt(7)));

        let controls = s.decode(0x0B, 0xBF, &regs(&[1]));
        assert_eq!(controls.get("ac_output_on"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn fields_outside_range_are_absent_without_error() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("inside", 0x00, 0x05)
            .add_uint_field("before", 0x00, 0x03)
            .add_version_field("straddling", 0x00, 0x06)
            .add_uint_field("other_page", 0x01, 0x05);

        let outcome = s.decode(0x00, 0x04, &regs(&[0, 42, 0]));

        assert!(outcome.is_clean());
        assert_eq!(outcome.values.len(), 1);
        assert_eq!(outcome.get("inside"), Some(&FieldValue::UnsignedInt(42)));
    }

    #[test]
    fn unknown_enum_does_not_stop_other_fields() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("before", 0x0B, 0xF3)
            .add_enum_field::<Mode, _>("mode", 0x0B, 0xF4)
            .add_bool_field("after", 0x0B, 0xF5);

        let outcome = s.decode(0x0B, 0xF3, &regs(&[3, 1, 1]));

        assert_eq!(
            outcome.errors,
            vec![DecodeError::UnknownEnumValue {
                field: "mode".to_owned(),
                raw: 1
            }]
        );
        assert_eq!(outcome.get("before"), Some(&FieldValue::UnsignedInt(3)));
        assert_eq!(outcome.get("after"), Some(&FieldValue::Bool(true)));
        assert_eq!(outcome.get("mode"), None);
    }

    #[test]
    fn short_response_truncates_fields_inside_command() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("first", 0x00, 0x00)
            .add_version_field("second", 0x00, 0x01)
            .add_uint_field("third", 0x00, 0x03);

        let cmd = QueryRangeCommand::new(0x00, 0x00, 4);
        let outcome = s.decode_response(&cmd, &regs(&[1, 2]));

        assert_eq!(outcome.get("first"), Some(&FieldValue::UnsignedInt(1)));
        assert_eq!(
            outcome.errors,
            vec![
                DecodeError::TruncatedField {
                    field: "second".to_owned(),
                    needed: 4,
                    available: 2
                },
                DecodeError::TruncatedField {
                    field: "third".to_owned(),
                    needed: 2,
                    available: 0
                },
            ]
        );
    }

    #[test]
    fn odd_trailing_byte_truncates_last_field() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("a", 0x00, 0x00).add_uint_field("b", 0x00, 0x01);

        let outcome = s.decode(0x00, 0x00, &[0, 1, 0]);

        assert_eq!(outcome.get("a"), Some(&FieldValue::UnsignedInt(1)));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field(), Some("b"));
    }

    #[test]
    fn unmapped_range_is_reported() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("a", 0x00, 0x00);

        let outcome = s.decode(0x00, 0x88, &regs(&[0; 4]));

        assert!(outcome.values.is_empty());
        assert_eq!(
            outcome.errors,
            vec![DecodeError::UnmappedRange {
                page: 0x00,
                start: 0x88,
                count: 4
            }]
        );
    }

    #[test]
    fn merge_accumulates() {
        let mut s = DeviceStruct::new();
        s.add_uint_field("a", 0x00, 0x00).add_uint_field("b", 0x0B, 0x10);

        let mut total = s.decode(0x00, 0x00, &regs(&[1]));
        total.merge(s.decode(0x0B, 0x10, &regs(&[2])));
        total.merge(s.decode(0x0B, 0x40, &regs(&[3])));

        assert_eq!(total.values.len(), 2);
        assert_eq!(total.get("b"), Some(&FieldValue::UnsignedInt(2)));
        assert_eq!(total.errors.len(), 1);
    }

    #[test]
    fn invalid_declarations_fail_fast() {
        let mut s = DeviceStruct::new();

        assert!(matches!(
            s.try_add_field("v", 0x00, 0xFFFF, FieldKind::VERSION),
            Err(DeclarationError::AddressOverflow { address: 0xFFFF, .. })
        ));
        assert!(s.is_empty());

        let result = std::panic::catch_unwind(|| {
            DeviceStruct::new().add_decimal_field("d", 0x00, 0x00, 9);
        });
        assert!(result.is_err());

        let result = std::panic::catch_unwind(|| {
            DeviceStruct::new().add_string_field("s", 0x00, 0x00, 0);
        });
        assert!(result.is_err());
    }

    #[test]
    fn shorter_serial_number_span() {
        let mut s = DeviceStruct::new();
        s.add_field("sn", 0x00, 0x11, FieldKind::serial_number_of(2).unwrap());

        let outcome = s.decode(0x00, 0x11, &regs(&[0x0001, 0x0002]));

        assert_eq!(outcome.get("sn"), Some(&FieldValue::SerialNumber(0x2_0001)));
    }

    #[test]
    fn partially_overlapped_field_is_not_unmapped() {
        let mut s = DeviceStruct::new();
        s.add_string_field("device_type", 0x00, 0x0A, 6);

        let outcome = s.decode(0x00, 0x0B, &regs(&[0, 0]));

        assert!(outcome.values.is_empty());
        assert!(outcome.is_clean(), "{:?}", outcome.errors);

        let tail = s.decode(0x00, 0x0F, &regs(&[0, 0]));
        assert!(tail.is_clean());

        let after = s.decode(0x00, 0x10, &regs(&[0, 0]));
        assert_eq!(after.errors.len(), 1);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn shared_across_threads() {
        assert_send_sync::<DeviceStruct>();
        assert_send_sync::<crate::devices::eb3a::Eb3a>();
        assert_send_sync::<DecodeOutcome>();

        let mut s = DeviceStruct::new();
        s.add_uint_field("a", 0x00, 0x00).add_enum_field::<Mode, _>("m", 0x00, 0x01);
        let s = &s;

        let expected = s.decode(0x00, 0x00, &regs(&[7, 2]));

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(move || s.decode(0x00, 0x00, &regs(&[7, 2]))))
                .collect();

            for worker in workers {
                assert_eq!(worker.join().unwrap(), expected);
            }
        });
    }
}
