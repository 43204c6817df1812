//! The binary module container.
//!
//! A module is a set of type and method definitions plus the tables their
//! bodies refer to by index: strings, type references and method references
//! (either to a definition in this module or an import from a reference).
//!
//! On disk a module is the 4-byte magic `SBLM`, a big-endian `u16` format
//! version, and the `postcard` encoding of [`Module`].

mod disasm;
mod signature;

pub use signature::{NULLABLE_TYPE, TypeSig};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File magic.
pub const MAGIC: [u8; 4] = *b"SBLM";

/// Current container format version.
pub const FORMAT_VERSION: u16 = 1;

/// Errors reading or writing a container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a module image (bad magic)")]
    BadMagic,

    #[error("unsupported module format version {found}, expected {expected}")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("malformed module image: {0}")]
    Malformed(#[from] postcard::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDefKind {
    Struct,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeSig,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
    pub base: Option<String>,
    pub generic_params: Vec<String>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeSig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Catch,
    Finally,
}

/// A protected range and its handler, as byte offsets into the method code.
///
/// Ends are exclusive. `exit` is the offset every `leave` out of the region
/// targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDef {
    pub kind: RegionKind,
    pub try_start: u32,
    pub try_end: u32,
    pub handler_start: u32,
    pub handler_end: u32,
    pub exit: u32,
    /// Type reference caught by a catch handler.
    pub catch_type: Option<u32>,
}

/// An encoded method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDef {
    pub code: Vec<u8>,
    pub locals: Vec<TypeSig>,
    pub regions: Vec<RegionDef>,
}

/// A declared method. Runtime declarations in reference modules have no body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub declaring_type: Option<String>,
    pub params: Vec<ParamDef>,
    pub ret: TypeSig,
    pub is_static: bool,
    pub is_virtual: bool,
    pub body: Option<BodyDef>,
}

impl MethodDef {
    /// `Type::name` or `name`.
    pub fn qualified_name(&self) -> String {
        match &self.declaring_type {
            Some(owner) => format!("{owner}::{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn param_types(&self) -> impl Iterator<Item = &TypeSig> {
        self.params.iter().map(|p| &p.ty)
    }
}

/// A method in a referenced module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodImport {
    pub declaring_type: TypeSig,
    pub name: String,
    pub params: Vec<TypeSig>,
    pub ret: TypeSig,
    pub is_static: bool,
}

/// Target of a call instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodRef {
    /// Index into [`Module::methods`].
    Def(u32),
    Import(MethodImport),
}

/// A compiled module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub types: Vec<TypeDef>,
    pub methods: Vec<MethodDef>,
    pub method_refs: Vec<MethodRef>,
    pub type_refs: Vec<TypeSig>,
    pub strings: Vec<String>,
    /// Index into [`Module::methods`].
    pub entry_point: Option<u32>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Methods declared on `type_name` called `name`.
    pub fn methods_named<'m>(
        &'m self,
        type_name: &'m str,
        name: &'m str,
    ) -> impl Iterator<Item = &'m MethodDef> + 'm {
        self.methods
            .iter()
            .filter(move |m| m.declaring_type.as_deref() == Some(type_name) && m.name == name)
    }

    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        bytes.extend_from_slice(&postcard::to_allocvec(self)?);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < 6 || bytes[..4] != MAGIC {
            return Err(ContainerError::BadMagic);
        }
        let found = u16::from_be_bytes([bytes[4], bytes[5]]);
        if found != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion {
                found,
                expected: FORMAT_VERSION,
            });
        }
        Ok(postcard::from_bytes(&bytes[6..])?)
    }

    /// Write the image in one go.
    pub fn write_to(&self, path: &Path) -> Result<(), ContainerError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, ContainerError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        let mut module = Module::new("sample");
        module.methods.push(MethodDef {
            name: "WriteLine".into(),
            declaring_type: Some("System.Console".into()),
            params: vec![ParamDef {
                name: "value".into(),
                ty: TypeSig::Object,
            }],
            ret: TypeSig::Void,
            is_static: true,
            is_virtual: false,
            body: None,
        });
        module.strings.push("hello".into());
        module
    }

    #[test]
    fn image_starts_with_magic_and_version() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"SBLM");
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
        assert_eq!(Module::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn rejects_foreign_images() {
        assert!(matches!(
            Module::from_bytes(b"MZ\x90\x00\x03\x00"),
            Err(ContainerError::BadMagic)
        ));
        assert!(matches!(
            Module::from_bytes(b"SBL"),
            Err(ContainerError::BadMagic)
        ));

        let mut bytes = sample().to_bytes().unwrap();
        bytes[5] = 99;
        assert!(matches!(
            Module::from_bytes(&bytes),
            Err(ContainerError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let bytes = sample().to_bytes().unwrap();
        assert!(matches!(
            Module::from_bytes(&bytes[..bytes.len() - 3]),
            Err(ContainerError::Malformed(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.sbl");
        sample().write_to(&path).unwrap();
        assert_eq!(Module::read_from(&path).unwrap(), sample());
    }

    #[test]
    fn lookup_by_type_and_name() {
        let module = sample();
        assert_eq!(module.methods_named("System.Console", "WriteLine").count(), 1);
        assert_eq!(module.methods_named("System.Console", "ReadLine").count(), 0);
    }
}
