//! Program calls.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::program::{
    BuildInfo, BuildProgram, CreateBinaryProgram, CreateSourceProgram, ProgramInfo,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::{Payload, PayloadValue};
use remotecl_protocol::ObjectId;

/// Program parameter naming the owning context.
pub const PROGRAM_CONTEXT: u32 = 0x1161;
/// Program parameter naming the attached devices.
pub const PROGRAM_DEVICES: u32 = 0x1163;
/// Program parameter requesting the compiled binaries.
pub const PROGRAM_BINARIES: u32 = 0x1166;

impl Connection {
    pub async fn create_program_with_source(
        &self,
        context: ObjectId,
        source: &str,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateSourceProgram {
                context,
                source: source.to_string(),
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Program);
        Ok(id.0)
    }

    /// Creates a program from per-device binaries. Returns the program ID
    /// and one load status per device.
    pub async fn create_program_with_binary(
        &self,
        context: ObjectId,
        devices: Vec<ObjectId>,
        binaries: &[Vec<u8>],
    ) -> Result<(ObjectId, Vec<i32>), ClientError> {
        // The server reads one payload per device.
        if devices.len() != binaries.len() {
            return Err(ClientError::InvalidArgument(
                remotecl_protocol::status::INVALID_VALUE,
            ));
        }

        let mut state = self.lock().await;
        state.stream.send(&CreateBinaryProgram(context)).await?;
        state.stream.send(&IdListPacket { ids: devices }).await?;
        for binary in binaries {
            state.stream.send(&Payload::<u32>::new(binary.clone())).await?;
        }
        state.stream.flush().await?;

        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Program);
        let statuses: Payload<u16> = state.stream.recv().await?;
        let codes = statuses
            .data
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        Ok((id.0, codes))
    }

    pub async fn build_program(
        &self,
        program: ObjectId,
        devices: Vec<ObjectId>,
        options: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&BuildProgram {
                program,
                options: options.to_string(),
            })
            .await?;
        state.stream.send(&IdListPacket { ids: devices }).await?;
        state.stream.flush().await?;
        state.stream.recv::<SuccessPacket>().await?;
        Ok(())
    }

    pub async fn program_build_info(
        &self,
        program: ObjectId,
        device: ObjectId,
        param: u32,
    ) -> Result<Vec<u8>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&BuildInfo {
                param,
                program,
                device,
            })
            .await?;
        state.stream.flush().await?;
        let reply: Payload = state.stream.recv().await?;
        Ok(reply.into_data())
    }

    pub async fn program_info(
        &self,
        program: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&ProgramInfo { param, id: program })
            .await?;
        state.stream.flush().await?;

        // Binaries come back as a count followed by one payload each;
        // everything else is a single response packet.
        if param == PROGRAM_BINARIES {
            let count: PayloadValue<u8> = state.stream.recv().await?;
            let mut binaries = Vec::with_capacity(usize::from(count.0));
            for _ in 0..count.0 {
                let payload: Payload = state.stream.recv().await?;
                binaries.push(payload.into_data());
            }
            return Ok(InfoReply::Binaries(binaries));
        }

        let reply = read_info_reply(&mut state.stream).await?;
        match &reply {
            InfoReply::Id(id) if param == PROGRAM_CONTEXT => {
                state.registry.get_or_insert(*id, ObjectKind::Context);
            }
            InfoReply::Ids(ids) if param == PROGRAM_DEVICES => {
                for &id in ids {
                    state.registry.get_or_insert(id, ObjectKind::Device);
                }
            }
            _ => {}
        }
        Ok(reply)
    }
}
