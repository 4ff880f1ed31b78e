//! Context creation and queries.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::{constants, NativeBackend};
use remotecl_protocol::packets::context::{
    CreateContext, CreateContextFromType, GetContextInfo, GetImageFormats,
};
use remotecl_protocol::packets::IdPacket;
use remotecl_protocol::payload::Payload;
use remotecl_protocol::ObjectId;

impl<B: NativeBackend> ServerInstance<B> {
    /// Rebuilds a property list, translating platform-valued entries from
    /// object IDs back to native handles. Properties travel as name/value
    /// pairs.
    fn translate_context_properties(&self, wire: &[u64]) -> Vec<u64> {
        let mut properties = Vec::with_capacity(wire.len());
        let mut iter = wire.iter();
        while let Some(&name) = iter.next() {
            properties.push(name);
            let Some(&value) = iter.next() else { break };
            if name == constants::CONTEXT_PLATFORM {
                properties.push(self.handles.get(value as ObjectId).0);
            } else {
                properties.push(value);
            }
        }
        properties
    }

    pub(crate) async fn create_context(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateContext>().await?;

        let devices: Vec<_> = packet
            .devices
            .iter()
            .map(|&id| self.handles.get(id))
            .collect();
        let properties = self.translate_context_properties(&packet.properties);

        match self.backend.create_context(&properties, &devices) {
            Ok(context) => {
                let id = self.handles.id_for(context)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn create_context_from_type(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateContextFromType>().await?;
        let properties = self.translate_context_properties(&packet.properties);

        match self
            .backend
            .create_context_from_type(&properties, packet.device_type)
        {
            Ok(context) => {
                let id = self.handles.id_for(context)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_context_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetContextInfo>().await?;
        let context = self.handles.get(query.id);

        match self.backend.context_info(context, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_image_formats(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetImageFormats>().await?;
        let context = self.handles.get(query.context_id);

        let formats = match self
            .backend
            .supported_image_formats(context, query.flags, query.image_type)
        {
            Ok(formats) => formats,
            Err(code) => return self.reply_error(code).await,
        };

        let mut bytes = Vec::with_capacity(formats.len() * 8);
        for format in &formats {
            bytes.extend_from_slice(&format.channel_order.to_le_bytes());
            bytes.extend_from_slice(&format.channel_type.to_le_bytes());
        }
        self.stream.send(&Payload::<u16>::new(bytes)).await?;
        Ok(())
    }
}
