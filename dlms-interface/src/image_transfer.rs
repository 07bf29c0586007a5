//! Image Transfer interface class (Class ID: 18)
//!
//! The Image Transfer interface class manages firmware and data image transfers
//! to DLMS/COSEM devices. An image is initiated with its identifier and size,
//! sent in numbered blocks, verified, then activated.
//!
//! # Attributes
//!
//! - Attribute 1: logical_name (OBIS code) - The logical name of the object
//! - Attribute 2: image_block_size - Largest block accepted, in bytes
//! - Attribute 3: image_transferred_blocks_status - One bit per block, set once received
//! - Attribute 4: image_first_not_transferred_block_number
//! - Attribute 5: image_transfer_enabled
//! - Attribute 6: image_transfer_status
//! - Attribute 7: image_to_activate_info - Size, identification and signature per image
//!
//! # Methods
//!
//! - Method 1: image_transfer_initiate(structure { identifier, size })
//! - Method 2: image_block_transfer(structure { block number, block })
//! - Method 3: image_verify
//! - Method 4: image_activate

use crate::context::Context;
use crate::cosem_object::{expect_no_parameters, method_denied, required_parameters, CosemObject};
use crate::object::ObjectBase;
use crate::object_type::ObjectType;
use crate::persistence::{PersistReader, PersistWriter};
use crate::schema::{AttributeDef, ClassSchema, MethodDef};
use dlms_core::datatypes::BitString;
use dlms_core::{DataObject, DataObjectType, DlmsError, DlmsResult, ObisCode};
use std::collections::BTreeMap;

static SCHEMA: ClassSchema = ClassSchema {
    object_type: ObjectType::ImageTransfer,
    max_version: 0,
    attributes: &[
        AttributeDef::logical_name(),
        AttributeDef::new("ImageBlockSize", DataObjectType::DoubleLongUnsigned)
            .read_only()
            .fixed(),
        AttributeDef::new("ImageTransferredBlocksStatus", DataObjectType::BitString).read_only(),
        AttributeDef::new("ImageFirstNotTransferredBlockNumber", DataObjectType::DoubleLongUnsigned)
            .read_only(),
        AttributeDef::new("ImageTransferEnabled", DataObjectType::Boolean).fixed(),
        AttributeDef::new("ImageTransferStatus", DataObjectType::Enumerate).read_only(),
        AttributeDef::new("ImageActivateInfo", DataObjectType::Array).read_only(),
    ],
    methods: &[
        MethodDef::new("ImageTransferInitiate"),
        MethodDef::new("ImageBlockTransfer"),
        MethodDef::new("ImageVerify"),
        MethodDef::new("ImageActivate"),
    ],
};

const DEFAULT_BLOCK_SIZE: u32 = 256;

/// Image transfer status (attribute 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ImageTransferStatus {
    #[default]
    NotInitiated = 0,
    TransferInitiated = 1,
    VerificationInitiated = 2,
    VerificationSuccessful = 3,
    VerificationFailed = 4,
    ActivationInitiated = 5,
    ActivationSuccessful = 6,
    ActivationFailed = 7,
}

impl ImageTransferStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::NotInitiated,
            1 => Self::TransferInitiated,
            2 => Self::VerificationInitiated,
            3 => Self::VerificationSuccessful,
            4 => Self::VerificationFailed,
            5 => Self::ActivationInitiated,
            6 => Self::ActivationSuccessful,
            7 => Self::ActivationFailed,
            _ => return None,
        })
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// One entry of image_to_activate_info
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageToActivate {
    pub size: u32,
    pub identification: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ImageToActivate {
    fn to_data_object(&self) -> DataObject {
        DataObject::Structure(vec![
            DataObject::Unsigned32(self.size),
            DataObject::OctetString(self.identification.clone()),
            DataObject::OctetString(self.signature.clone()),
        ])
    }

    fn from_data_object(value: &DataObject) -> DlmsResult<Self> {
        let fields = value.as_structure_of(3)?;
        Ok(Self {
            size: fields[0].to_u32()?,
            identification: fields[1].as_octet_string()?.to_vec(),
            signature: fields[2].as_octet_string()?.to_vec(),
        })
    }
}

/// Image Transfer interface class (Class ID: 18)
///
/// Default OBIS: 0-0:44.0.0.255
#[derive(Debug)]
pub struct ImageTransfer {
    base: ObjectBase,
    block_size: u32,
    transferred_blocks: BitString,
    first_not_transferred: u32,
    enabled: bool,
    status: ImageTransferStatus,
    images_to_activate: Vec<ImageToActivate>,
    identifier: Vec<u8>,
    image_size: u32,
    /// Received blocks by block number
    blocks: BTreeMap<u32, Vec<u8>>,
}

impl ImageTransfer {
    pub const ATTR_IMAGE_BLOCK_SIZE: u8 = 2;
    pub const ATTR_TRANSFERRED_BLOCKS_STATUS: u8 = 3;
    pub const ATTR_FIRST_NOT_TRANSFERRED_BLOCK: u8 = 4;
    pub const ATTR_TRANSFER_ENABLED: u8 = 5;
    pub const ATTR_TRANSFER_STATUS: u8 = 6;
    pub const ATTR_IMAGE_TO_ACTIVATE_INFO: u8 = 7;

    pub const METHOD_INITIATE: u8 = 1;
    pub const METHOD_BLOCK_TRANSFER: u8 = 2;
    pub const METHOD_VERIFY: u8 = 3;
    pub const METHOD_ACTIVATE: u8 = 4;

    pub fn default_obis() -> ObisCode {
        ObisCode::new(0, 0, 44, 0, 0, 255)
    }

    pub fn new(logical_name: ObisCode) -> Self {
        Self {
            base: ObjectBase::initial(&SCHEMA, Some(logical_name)),
            block_size: DEFAULT_BLOCK_SIZE,
            transferred_blocks: BitString::default(),
            first_not_transferred: 0,
            enabled: true,
            status: ImageTransferStatus::NotInitiated,
            images_to_activate: Vec::new(),
            identifier: Vec::new(),
            image_size: 0,
            blocks: BTreeMap::new(),
        }
    }

    pub fn with_default_obis() -> Self {
        Self::new(Self::default_obis())
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn transferred_blocks(&self) -> &BitString {
        &self.transferred_blocks
    }

    pub fn first_not_transferred_block(&self) -> u32 {
        self.first_not_transferred
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> ImageTransferStatus {
        self.status
    }

    pub fn images_to_activate(&self) -> &[ImageToActivate] {
        &self.images_to_activate
    }

    /// Bytes received so far for the current image
    pub fn received_bytes(&self) -> u64 {
        self.blocks.values().map(|block| block.len() as u64).sum()
    }

    fn initiate(&mut self, parameters: DataObject) -> DlmsResult<()> {
        let fields = parameters.as_structure_of(2)?;
        let identifier = fields[0].as_octet_string()?.to_vec();
        let image_size = fields[1].to_u32()?;
        if !self.enabled {
            log::warn!("Image transfer initiated while disabled");
            return Err(DlmsError::InconsistentClass(
                "Image transfer is not enabled".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(DlmsError::InconsistentClass("Image block size is 0".to_string()));
        }

        let block_count = image_size.div_ceil(self.block_size);
        log::debug!(
            "Initiating image {} of {} bytes in {} blocks",
            hex::encode(&identifier),
            image_size,
            block_count
        );
        self.identifier = identifier;
        self.image_size = image_size;
        self.blocks.clear();
        self.transferred_blocks = BitString::zeros(block_count as usize);
        self.first_not_transferred = 0;
        self.images_to_activate.clear();
        self.status = ImageTransferStatus::TransferInitiated;
        Ok(())
    }

    fn block_transfer(&mut self, parameters: DataObject) -> DlmsResult<()> {
        let fields = parameters.as_structure_of(2)?;
        let number = fields[0].to_u32()?;
        let data = fields[1].as_octet_string()?;
        if self.status != ImageTransferStatus::TransferInitiated {
            return Err(DlmsError::InconsistentClass(format!(
                "Block {} received while transfer status is {:?}",
                number, self.status
            )));
        }
        let index = number as usize;
        if index >= self.transferred_blocks.num_bits() {
            return Err(DlmsError::InconsistentClass(format!(
                "Block {} is outside the {} blocks of the image",
                number,
                self.transferred_blocks.num_bits()
            )));
        }
        // Every block is full except the last, which holds the remainder.
        let offset = u64::from(number) * u64::from(self.block_size);
        let expected = (u64::from(self.image_size) - offset).min(u64::from(self.block_size));
        if data.len() as u64 != expected {
            return Err(DlmsError::InconsistentClass(format!(
                "Block {} holds {} bytes, expected {}",
                number,
                data.len(),
                expected
            )));
        }

        self.transferred_blocks.set_bit(index, true)?;
        self.blocks.insert(number, data.to_vec());
        self.first_not_transferred = self.transferred_blocks.first_zero() as u32;
        Ok(())
    }

    fn verify(&mut self) -> DlmsResult<()> {
        if self.status != ImageTransferStatus::TransferInitiated {
            return Err(DlmsError::InconsistentClass(format!(
                "Image cannot be verified while transfer status is {:?}",
                self.status
            )));
        }
        let received = self.received_bytes();
        let complete = self.transferred_blocks.first_zero() == self.transferred_blocks.num_bits();
        if !complete || received != u64::from(self.image_size) {
            log::warn!(
                "Image verification failed: {} of {} bytes in {} of {} blocks received",
                received,
                self.image_size,
                self.transferred_blocks.count_ones(),
                self.transferred_blocks.num_bits()
            );
            self.status = ImageTransferStatus::VerificationFailed;
            return Err(DlmsError::InconsistentClass(format!(
                "Received {} bytes, image size is {}",
                received, self.image_size
            )));
        }
        self.status = ImageTransferStatus::VerificationSuccessful;
        self.images_to_activate = vec![ImageToActivate {
            size: self.image_size,
            identification: self.identifier.clone(),
            signature: Vec::new(),
        }];
        Ok(())
    }

    fn activate(&mut self) -> DlmsResult<()> {
        if self.status != ImageTransferStatus::VerificationSuccessful {
            return Err(DlmsError::InconsistentClass(format!(
                "Image cannot be activated while transfer status is {:?}",
                self.status
            )));
        }
        self.status = ImageTransferStatus::ActivationSuccessful;
        self.blocks.clear();
        Ok(())
    }
}

impl CosemObject for ImageTransfer {
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
            Self::ATTR_IMAGE_BLOCK_SIZE => DataObject::Unsigned32(self.block_size),
            Self::ATTR_TRANSFERRED_BLOCKS_STATUS => {
                DataObject::BitString(self.transferred_blocks.clone())
            }
            Self::ATTR_FIRST_NOT_TRANSFERRED_BLOCK => {
                DataObject::Unsigned32(self.first_not_transferred)
            }
            Self::ATTR_TRANSFER_ENABLED => DataObject::Boolean(self.enabled),
            Self::ATTR_TRANSFER_STATUS => DataObject::Enumerate(self.status.to_u8()),
            _ => DataObject::Array(
                self.images_to_activate
                    .iter()
                    .map(ImageToActivate::to_data_object)
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
            Self::ATTR_IMAGE_BLOCK_SIZE => self.block_size = value.to_u32()?,
            Self::ATTR_TRANSFERRED_BLOCKS_STATUS => {
                self.transferred_blocks = value.as_bit_string()?.clone();
            }
            Self::ATTR_FIRST_NOT_TRANSFERRED_BLOCK => self.first_not_transferred = value.to_u32()?,
            Self::ATTR_TRANSFER_ENABLED => self.enabled = value.as_bool()?,
            Self::ATTR_TRANSFER_STATUS => {
                let code = value.to_u8()?;
                self.status = ImageTransferStatus::from_u8(code).ok_or_else(|| {
                    DlmsError::type_mismatch("ImageTransferStatus", format!("Enumerate({})", code))
                })?;
            }
            _ => {
                self.images_to_activate = value
                    .as_array()?
                    .iter()
                    .map(ImageToActivate::from_data_object)
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
            Self::METHOD_INITIATE => self.initiate(required_parameters(parameters)?)?,
            Self::METHOD_BLOCK_TRANSFER => self.block_transfer(required_parameters(parameters)?)?,
            Self::METHOD_VERIFY => {
                expect_no_parameters(&parameters)?;
                self.verify()?;
            }
            Self::METHOD_ACTIVATE => {
                expect_no_parameters(&parameters)?;
                self.activate()?;
            }
            _ => return Err(method_denied(ObjectType::ImageTransfer, index)),
        }
        Ok(None)
    }

    fn save(&self, writer: &mut PersistWriter) -> DlmsResult<()> {
        writer.write("BlockSize", &self.block_size)?;
        writer.write("TransferredBlocks", &self.transferred_blocks.to_string())?;
        writer.write("FirstNotTransferred", &self.first_not_transferred)?;
        writer.write("Enabled", &self.enabled)?;
        writer.write("Status", &self.status.to_u8())?;
        writer.write_bytes("Identification", &self.identifier)?;
        writer.write("ImageSize", &self.image_size)?;
        writer.write_list("ImagesToActivate", &self.images_to_activate, |item, image| {
            item.write("Size", &image.size)?;
            item.write_bytes("Identification", &image.identification)?;
            item.write_bytes("Signature", &image.signature)
        })
    }

    fn load(&mut self, reader: &PersistReader<'_>) -> DlmsResult<()> {
        let block_size = reader.read_or("BlockSize", DEFAULT_BLOCK_SIZE)?;
        let bits: String = reader.read("TransferredBlocks")?;
        let transferred_blocks = BitString::from_bit_str(&bits)
            .map_err(|e| DlmsError::Persistence(format!("TransferredBlocks: {}", e)))?;
        let first_not_transferred = reader.read("FirstNotTransferred")?;
        let enabled = reader.read_or("Enabled", true)?;
        let code: u8 = reader.read("Status")?;
        let mut status = ImageTransferStatus::from_u8(code).ok_or_else(|| {
            DlmsError::Persistence(format!("Unknown image transfer status {}", code))
        })?;
        let identifier = reader.read_bytes("Identification")?;
        let image_size = reader.read("ImageSize")?;
        let images_to_activate = reader.read_list("ImagesToActivate", |item| {
            Ok(ImageToActivate {
                size: item.read("Size")?,
                identification: item.read_bytes("Identification")?,
                signature: item.read_bytes("Signature")?,
            })
        })?;

        // Received blocks are not stored, so a transfer in progress restarts.
        let mut transferred_blocks = transferred_blocks;
        let mut first_not_transferred = first_not_transferred;
        if matches!(
            status,
            ImageTransferStatus::TransferInitiated | ImageTransferStatus::VerificationInitiated
        ) {
            log::info!("Image transfer of {} was interrupted", hex::encode(&identifier));
            status = ImageTransferStatus::NotInitiated;
            transferred_blocks = BitString::default();
            first_not_transferred = 0;
        }

        self.block_size = block_size;
        self.transferred_blocks = transferred_blocks;
        self.first_not_transferred = first_not_transferred;
        self.enabled = enabled;
        self.status = status;
        self.images_to_activate = images_to_activate;
        self.identifier = identifier;
        self.image_size = image_size;
        self.blocks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initiate(image: &mut ImageTransfer, ctx: &Context<'_>, size: u32) {
        let parameters = DataObject::Structure(vec![
            DataObject::OctetString(b"FW1".to_vec()),
            DataObject::Unsigned32(size),
        ]);
        image.invoke(ctx, ImageTransfer::METHOD_INITIATE, Some(parameters)).unwrap();
    }

    fn block(number: u32, len: usize) -> Option<DataObject> {
        Some(DataObject::Structure(vec![
            DataObject::Unsigned32(number),
            DataObject::OctetString(vec![0xA5; len]),
        ]))
    }

    fn transfer_blocks(image: &mut ImageTransfer, ctx: &Context<'_>, count: u32, len: usize) {
        for number in 0..count {
            image
                .invoke(ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(number, len))
                .unwrap();
        }
    }

    #[test]
    fn test_image_transfer_complete_image_verifies() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 1000);
        assert_eq!(image.status(), ImageTransferStatus::TransferInitiated);
        assert_eq!(image.transferred_blocks().num_bits(), 5);

        transfer_blocks(&mut image, &ctx, 5, 200);
        assert_eq!(image.transferred_blocks().count_ones(), 5);
        assert_eq!(image.first_not_transferred_block(), 5);
        assert_eq!(image.get_value(&ctx, 4).unwrap(), DataObject::Unsigned32(5));

        image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).unwrap();
        assert_eq!(image.status(), ImageTransferStatus::VerificationSuccessful);
        assert_eq!(image.images_to_activate()[0].identification, b"FW1".to_vec());

        image.invoke(&ctx, ImageTransfer::METHOD_ACTIVATE, None).unwrap();
        assert_eq!(image.status(), ImageTransferStatus::ActivationSuccessful);
    }

    #[test]
    fn test_image_transfer_missing_bytes_fail_verification() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 1000);
        transfer_blocks(&mut image, &ctx, 4, 200);
        assert_eq!(image.first_not_transferred_block(), 4);

        let result = image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None);
        assert!(matches!(result, Err(DlmsError::InconsistentClass(_))));
        assert_eq!(image.status(), ImageTransferStatus::VerificationFailed);
        assert_eq!(image.get_value(&ctx, 6).unwrap(), DataObject::Enumerate(4));
        assert!(image.invoke(&ctx, ImageTransfer::METHOD_ACTIVATE, None).is_err());
    }

    #[test]
    fn test_image_transfer_rejects_inconsistent_blocks() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        assert!(matches!(
            image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(0, 10)),
            Err(DlmsError::InconsistentClass(_))
        ));

        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 300);
        assert!(matches!(
            image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(0, 201)),
            Err(DlmsError::InconsistentClass(_))
        ));
        transfer_blocks(&mut image, &ctx, 1, 200);
        assert!(matches!(
            image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(1, 101)),
            Err(DlmsError::InconsistentClass(_))
        ));
        assert_eq!(image.received_bytes(), 200);
        assert!(matches!(
            image.invoke(
                &ctx,
                ImageTransfer::METHOD_BLOCK_TRANSFER,
                Some(DataObject::Unsigned8(1))
            ),
            Err(DlmsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_image_transfer_rejects_blocks_outside_image() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 1000);
        transfer_blocks(&mut image, &ctx, 5, 200);

        for number in [5, 9, 50_000_000, u32::MAX] {
            assert!(matches!(
                image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(number, 0)),
                Err(DlmsError::InconsistentClass(_))
            ));
        }
        assert_eq!(image.transferred_blocks().num_bits(), 5);
        assert_eq!(image.transferred_blocks().count_ones(), 5);
        image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).unwrap();
    }

    #[test]
    fn test_image_transfer_rejects_short_blocks() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 900);
        transfer_blocks(&mut image, &ctx, 4, 200);

        for len in [0, 99, 200] {
            assert!(matches!(
                image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(4, len)),
                Err(DlmsError::InconsistentClass(_))
            ));
        }
        assert!(image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(2, 0)).is_err());
        assert_eq!(image.transferred_blocks().to_string(), "11110");
        assert_eq!(image.first_not_transferred_block(), 4);

        image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(4, 100)).unwrap();
        image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).unwrap();
        assert_eq!(image.images_to_activate()[0].size, 900);
    }

    #[test]
    fn test_image_transfer_interrupted_transfer_restarts_after_load() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 1000);
        transfer_blocks(&mut image, &ctx, 2, 200);

        let mut writer = PersistWriter::new();
        image.save(&mut writer).unwrap();
        let elements = writer.into_map();
        let mut restored = ImageTransfer::with_default_obis();
        restored.load(&PersistReader::new(&elements)).unwrap();

        assert_eq!(restored.status(), ImageTransferStatus::NotInitiated);
        assert_eq!(restored.received_bytes(), 0);
        assert!(restored.transferred_blocks().is_empty());
        assert!(matches!(
            restored.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None),
            Err(DlmsError::InconsistentClass(_))
        ));
        assert!(restored.invoke(&ctx, ImageTransfer::METHOD_ACTIVATE, None).is_err());
        assert!(restored
            .invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, block(2, 200))
            .is_err());

        initiate(&mut restored, &ctx, 1000);
        transfer_blocks(&mut restored, &ctx, 5, 200);
        restored.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).unwrap();
    }

    #[test]
    fn test_image_transfer_keeps_image_details_across_load() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
        initiate(&mut image, &ctx, 1000);
        transfer_blocks(&mut image, &ctx, 5, 200);
        image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).unwrap();

        let mut writer = PersistWriter::new();
        image.save(&mut writer).unwrap();
        let elements = writer.into_map();
        let mut restored = ImageTransfer::with_default_obis();
        restored.load(&PersistReader::new(&elements)).unwrap();

        assert_eq!(restored.status(), ImageTransferStatus::VerificationSuccessful);
        assert_eq!(restored.transferred_blocks().to_string(), "11111");
        assert_eq!(restored.images_to_activate(), image.images_to_activate());
        restored.invoke(&ctx, ImageTransfer::METHOD_ACTIVATE, None).unwrap();
    }

    #[test]
    fn test_image_transfer_disabled() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        image.set_value(&ctx, 5, DataObject::Boolean(false)).unwrap();
        let parameters = DataObject::Structure(vec![
            DataObject::OctetString(b"FW1".to_vec()),
            DataObject::Unsigned32(10),
        ]);
        assert!(matches!(
            image.invoke(&ctx, ImageTransfer::METHOD_INITIATE, Some(parameters)),
            Err(DlmsError::InconsistentClass(_))
        ));
        assert_eq!(image.status(), ImageTransferStatus::NotInitiated);
    }

    #[test]
    fn test_image_transfer_status_rejects_unknown_code() {
        let mut image = ImageTransfer::with_default_obis();
        let ctx = Context::default();
        assert!(image.set_value(&ctx, 6, DataObject::Enumerate(9)).is_err());
        assert!(!image.base().is_read(6));
    }
}
