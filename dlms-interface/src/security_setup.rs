//! COSEM Security Setup interface class (Class ID: 64)
//!
//! This interface class holds the security parameters of an association:
//! the security policy, the security suite and the system titles of both
//! peers. Version 1 adds the list of installed certificates.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code)
//! - Attribute 2: security_policy
//! - Attribute 3: security_suite
//! - Attribute 4: client_system_title
//! - Attribute 5: server_system_title
//! - Attribute 6: certificates (since version 1)
//!
//! # Methods
//!
//! - Method 1: security_activate
//! - Method 2: global_key_transfer
//! - Methods 3-7: key agreement and certificate management (since version 1)
//! - Method 8: remove_certificate (since version 1)

use crate::context::Context;
use crate::cosem_object::{method_denied, required_parameters, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema, MethodDef};
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};
use std::collections::BTreeMap;

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::SecuritySetup,
    max_version: 1,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("SecurityPolicy", DataObjectType::Enumerate).read_only(),
        AttributeDef::new("SecuritySuite", DataObjectType::Enumerate).read_only().fixed(),
        AttributeDef::new("ClientSystemTitle", DataObjectType::OctetString),
        AttributeDef::new("ServerSystemTitle", DataObjectType::OctetString).read_only().fixed(),
        AttributeDef::new("Certificates", DataObjectType::Array).read_only().since(1),
    ],
    methods: &[
        MethodDef::new("SecurityActivate"),
        MethodDef::new("GlobalKeyTransfer"),
        MethodDef::new("KeyAgreement").since(1),
        MethodDef::new("GenerateKeyPair").since(1),
        MethodDef::new("GenerateCertificateRequest").since(1),
        MethodDef::new("ImportCertificate").since(1),
        MethodDef::new("ExportCertificate").since(1),
        MethodDef::new("RemoveCertificate").since(1),
    ],
};

/// Owner of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CertificateEntity {
    #[default]
    Server = 0,
    Client = 1,
    CertificationAuthority = 2,
    Other = 3,
}

impl CertificateEntity {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Server,
            1 => Self::Client,
            2 => Self::CertificationAuthority,
            3 => Self::Other,
            _ => return None,
        })
    }
}

/// Purpose of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CertificateType {
    #[default]
    DigitalSignature = 0,
    KeyAgreement = 1,
    Tls = 2,
    Other = 3,
}

impl CertificateType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::DigitalSignature,
            1 => Self::KeyAgreement,
            2 => Self::Tls,
            3 => Self::Other,
            _ => return None,
        })
    }
}

/// Entry of the certificates attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateInfo {
    pub entity: CertificateEntity,
    pub certificate_type: CertificateType,
    pub serial_number: Vec<u8>,
    pub issuer: Vec<u8>,
    pub subject: Vec<u8>,
    pub subject_alt_name: Vec<u8>,
}

impl CertificateInfo {
    fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![
            DataObject::Enumerate(self.entity as u8),
            DataObject::Enumerate(self.certificate_type as u8),
            DataObject::OctetString(self.serial_number.clone()),
            DataObject::OctetString(self.issuer.clone()),
            DataObject::OctetString(self.subject.clone()),
            DataObject::OctetString(self.subject_alt_name.clone()),
        ])
    }

    fn from_data_object(value: &DataObject) -> DlmsResult<Self> {
        let fields = value.as_structure_of(6)?;
        Ok(Self {
            entity: entity_from(&fields[0])?,
            certificate_type: certificate_type_from(&fields[1])?,
            serial_number: fields[2].as_octet_string()?.to_vec(),
            issuer: fields[3].as_octet_string()?.to_vec(),
            subject: fields[4].as_octet_string()?.to_vec(),
            subject_alt_name: fields[5].as_octet_string()?.to_vec(),
        })
    }
}

fn entity_from(value: &DataObject) -> DlmsResult<CertificateEntity> {
    let code = value.to_u8()?;
    CertificateEntity::from_u8(code)
        .ok_or_else(|| {
            DlmsError::type_mismatch("CertificateEntity", format!("Enumerate({})", code))
        })
}

fn certificate_type_from(value: &DataObject) -> DlmsResult<CertificateType> {
    let code = value.to_u8()?;
    CertificateType::from_u8(code)
        .ok_or_else(|| DlmsError::type_mismatch("CertificateType", format!("Enumerate({})", code)))
}

/// Security Setup interface class (Class ID: 64)
///
/// Default OBIS: 0-0:43.0.0.255
///
/// Keys received through `global_key_transfer` are kept in memory only and
/// never written to the persistence document.
#[derive(Debug)]
pub struct SecuritySetup {
    base: ObjectBase,
    security_policy: u8,
    security_suite: u8,
    client_system_title: Vec<u8>,
    server_system_title: Vec<u8>,
    certificates: Vec<CertificateInfo>,
    transferred_keys: BTreeMap<u8, Vec<u8>>,
}

impl SecuritySetup {
    pub const ATTR_SECURITY_POLICY: u8 = 2;
    pub const ATTR_SECURITY_SUITE: u8 = 3;
    pub const ATTR_CLIENT_SYSTEM_TITLE: u8 = 4;
    pub const ATTR_SERVER_SYSTEM_TITLE: u8 = 5;
    pub const ATTR_CERTIFICATES: u8 = 6;

    pub const METHOD_SECURITY_ACTIVATE: u8 = 1;
    pub const METHOD_GLOBAL_KEY_TRANSFER: u8 = 2;
    pub const METHOD_REMOVE_CERTIFICATE: u8 = 8;

    pub fn default_obis() -> ObisCode {
        ObisCode::new(0, 0, 43, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode) -> Self {
        Self::from_base(ObjectBase::initial(&SCHEMA, Some(logical_name)))
    }

    /// Security setup object of schema `version` (0 or 1)
    pub fn with_version(logical_name: ObisCode, version: u8) -> DlmsResult<Self> {
        Ok(Self::from_base(ObjectBase::from_schema(&SCHEMA, Some(logical_name), version)?))
    }

    fn from_base(base: ObjectBase) -> Self {
        Self {
            base,
            security_policy: 0,
            security_suite: 0,
            client_system_title: Vec::new(),
            server_system_title: Vec::new(),
            certificates: Vec::new(),
            transferred_keys: BTreeMap::new(),
        }
    }

    pub fn security_policy(&self) -> u8 {
        self.security_policy
    }

    pub fn security_suite(&self) -> u8 {
        self.security_suite
    }

    pub fn client_system_title(&self) -> &[u8] {
        &self.client_system_title
    }

    pub fn server_system_title(&self) -> &[u8] {
        &self.server_system_title
    }

    pub fn certificates(&self) -> &[CertificateInfo] {
        &self.certificates
    }

    /// Wrapped key received for `key_id`, if any
    pub fn transferred_key(&self, key_id: u8) -> Option<&[u8]> {
        self.transferred_keys.get(&key_id).map(Vec::as_slice)
    }

    /// Version 0 policies are ordered levels; version 1 policies are bit sets
    /// and a raise must keep every bit already set.
    fn is_raise(&self, policy: u8) -> bool {
        if self.version() == 0 {
            policy >= self.security_policy
        } else {
            policy & self.security_policy == self.security_policy
        }
    }

    fn security_activate(&mut self, parameters: DataObject) -> DlmsResult<()> {
        let policy = parameters.to_u8()?;
        if !self.is_raise(policy) {
            return Err(DlmsError::InconsistentClass(format!(
                "Security policy can't be lowered from {} to {}",
                self.security_policy, policy
            )));
        }
        log::info!(
            "Security policy of {:?} raised from {} to {}",
            self.base.logical_name(),
            self.security_policy,
            policy
        );
        self.security_policy = policy;
        Ok(())
    }

    fn global_key_transfer(&mut self, parameters: DataObject) -> DlmsResult<()> {
        let mut keys = Vec::new();
        for item in parameters.as_array()? {
            let fields = item.as_structure_of(2)?;
            keys.push((fields[0].to_u8()?, fields[1].as_octet_string()?.to_vec()));
        }
        for (key_id, wrapped) in keys {
            log::debug!("Global key {} transferred ({} bytes)", key_id, wrapped.len());
            self.transferred_keys.insert(key_id, wrapped);
        }
        Ok(())
    }

    fn remove_certificate(&mut self, parameters: DataObject) -> DlmsResult<()> {
        let fields = parameters.as_structure_of(2)?;
        let kind = fields[0].to_u8()?;
        let identification = fields[1].as_structure()?;
        let position = match kind {
            0 => {
                if identification.len() < 2 {
                    return Err(DlmsError::type_mismatch(
                        "Structure(2)",
                        format!("Structure({})", identification.len()),
                    ));
                }
                let entity = entity_from(&identification[0])?;
                let certificate_type = certificate_type_from(&identification[1])?;
                self.certificates
                    .iter()
                    .position(|c| c.entity == entity && c.certificate_type == certificate_type)
            }
            1 => {
                if identification.len() != 2 {
                    return Err(DlmsError::type_mismatch(
                        "Structure(2)",
                        format!("Structure({})", identification.len()),
                    ));
                }
                let serial_number = identification[0].as_octet_string()?;
                let issuer = identification[1].as_octet_string()?;
                self.certificates
                    .iter()
                    .position(|c| c.serial_number == serial_number && c.issuer == issuer)
            }
            other => {
                return Err(DlmsError::type_mismatch(
                    "certificate identification type 0 or 1",
                    format!("Enumerate({})", other),
                ));
            }
        };
        let position = position.ok_or_else(|| {
            DlmsError::InconsistentClass("No matching certificate is installed".to_string())
        })?;
        self.certificates.remove(position);
        Ok(())
    }
}

impl CosemObject for SecuritySetup {
    fn schema(&self) -> &'static ClassSchema {
        &SCHEMA
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_attribute(&self, _ctx: &Context<'_>, index: u8) -> DlmsResult<DataObject> {
        Ok(match index {
            Self::ATTR_SECURITY_POLICY => DataObject::Enumerate(self.security_policy),
            Self::ATTR_SECURITY_SUITE => DataObject::Enumerate(self.security_suite),
            Self::ATTR_CLIENT_SYSTEM_TITLE => {
                DataObject::OctetString(self.client_system_title.clone())
            }
            Self::ATTR_SERVER_SYSTEM_TITLE => {
                DataObject::OctetString(self.server_system_title.clone())
            }
            _ => DataObject::Array(
                self.certificates
                    .iter()
                    .map(CertificateInfo::to_data_object)
                    .collect(),
            ),
        })
    }

    fn set_attribute(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        value: DataObject,
    ) -> DlmsResult<()> {
        match index {
            Self::ATTR_SECURITY_POLICY => self.security_policy = value.to_u8()?,
            Self::ATTR_SECURITY_SUITE => self.security_suite = value.to_u8()?,
            Self::ATTR_CLIENT_SYSTEM_TITLE => {
                self.client_system_title = value.as_octet_string()?.to_vec()
            }
            Self::ATTR_SERVER_SYSTEM_TITLE => {
                self.server_system_title = value.as_octet_string()?.to_vec()
            }
            _ => {
                self.certificates = value
                    .as_array()?
                    .iter()
                    .map(CertificateInfo::from_data_object)
                    .collect::<DlmsResult<_>>()?;
            }
        }
        Ok(())
    }

    fn invoke_method(
        &mut self,
        _ctx: &Context<'_>,
        index: u8,
        parameters: Option<DataObject>,
    ) -> DlmsResult<Option<DataObject>> {
        match index {
            Self::METHOD_SECURITY_ACTIVATE => {
                self.security_activate(required_parameters(parameters)?)?
            }
            Self::METHOD_GLOBAL_KEY_TRANSFER => {
                self.global_key_transfer(required_parameters(parameters)?)?
            }
            Self::METHOD_REMOVE_CERTIFICATE => {
                self.remove_certificate(required_parameters(parameters)?)?
            }
            // Key agreement and certificate generation need the ciphering layer.
            _ => return Err(method_denied(ObjectType::SecuritySetup, index)),
        }
        Ok(None)
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("SecurityPolicy", &self.security_policy)?;
        writer.write("SecuritySuite", &self.security_suite)?;
        writer.write_bytes("ClientSystemTitle", &self.client_system_title)?;
        writer.write_bytes("ServerSystemTitle", &self.server_system_title)?;
        if self.version() >= 1 {
            writer.write_list("Certificates", &self.certificates, |item, certificate| {
                item.write("Entity", &(certificate.entity as u8))?;
                item.write("Type", &(certificate.certificate_type as u8))?;
                item.write_bytes("SerialNumber", &certificate.serial_number)?;
                item.write_bytes("Issuer", &certificate.issuer)?;
                item.write_bytes("Subject", &certificate.subject)?;
                item.write_bytes("SubjectAltName", &certificate.subject_alt_name)
            })?;
        }
        Ok(())
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let security_policy = reader.read("SecurityPolicy")?;
        let security_suite = reader.read("SecuritySuite")?;
        let client_system_title = reader.read_bytes("ClientSystemTitle")?;
        let server_system_title = reader.read_bytes("ServerSystemTitle")?;
        let certificates = reader.read_list("Certificates", |item| {
            let entity: u8 = item.read("Entity")?;
            let certificate_type: u8 = item.read("Type")?;
            Ok(CertificateInfo {
                entity: CertificateEntity::from_u8(entity).ok_or_else(|| {
                    DlmsError::Persistence(format!("Unknown certificate entity {}", entity))
                })?,
                certificate_type: CertificateType::from_u8(certificate_type).ok_or_else(|| {
                    DlmsError::Persistence(format!("Unknown certificate type {}", certificate_type))
                })?,
                serial_number: item.read_bytes("SerialNumber")?,
                issuer: item.read_bytes("Issuer")?,
                subject: item.read_bytes("Subject")?,
                subject_alt_name: item.read_bytes("SubjectAltName")?,
            })
        })?;

        self.security_policy = security_policy;
        self.security_suite = security_suite;
        self.client_system_title = client_system_title;
        self.server_system_title = server_system_title;
        self.certificates = certificates;
        Ok(())
    }
}
