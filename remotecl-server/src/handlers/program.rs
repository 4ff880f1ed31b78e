//! Program handlers.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use remotecl_protocol::packets::program::{
    BuildInfo, BuildProgram, CreateBinaryProgram, CreateSourceProgram, ProgramInfo,
};
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::Payload;

/// Required for the kernel-argument negotiation to work: without argument
/// introspection the server cannot classify arguments.
const KERNEL_ARG_INFO_OPTION: &str = "-cl-kernel-arg-info";

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_program_from_source(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateSourceProgram>().await?;
        let context = self.handles.get(packet.context);

        match self
            .backend
            .create_program_with_source(context, &packet.source)
        {
            Ok(program) => {
                let id = self.handles.id_for(program)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn create_program_from_binary(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateBinaryProgram>().await?;
        let context = self.handles.get(packet.0);

        let device_list = self.stream.recv::<IdListPacket>().await?;
        let devices: Vec<_> = device_list
            .ids
            .iter()
            .map(|&id| self.handles.get(id))
            .collect();

        // One payload per device binary.
        let mut binaries = Vec::with_capacity(devices.len());
        for _ in 0..devices.len() {
            let payload: Payload = self.stream.recv().await?;
            binaries.push(payload.into_data());
        }

        match self
            .backend
            .create_program_with_binary(context, &devices, &binaries)
        {
            Ok((program, statuses)) => {
                let id = self.handles.id_for(program)?;
                self.stream.send(&IdPacket(id)).await?;
                let mut bytes = Vec::with_capacity(statuses.len() * 4);
                for status in statuses {
                    bytes.extend_from_slice(&status.to_le_bytes());
                }
                self.stream.send(&Payload::<u16>::new(bytes)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn build_program(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<BuildProgram>().await?;
        let device_list = self.stream.recv::<IdListPacket>().await?;

        let program = self.handles.get(packet.program);
        let devices: Vec<_> = device_list
            .ids
            .iter()
            .map(|&id| self.handles.get(id))
            .collect();

        // Some compilers reject the option appearing twice, so only append
        // it when absent.
        let mut options = packet.options;
        if !options.contains(KERNEL_ARG_INFO_OPTION) {
            if !options.is_empty() {
                options.push(' ');
            }
            options.push_str(KERNEL_ARG_INFO_OPTION);
        }

        match self.backend.build_program(program, &devices, &options) {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_program_build_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<BuildInfo>().await?;
        let program = self.handles.get(query.program);
        let device = self.handles.get(query.device);

        match self.backend.program_build_info(program, device, query.param) {
            Ok(reply) => {
                self.stream.send(&Payload::<u32>::new(reply)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_program_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<ProgramInfo>().await?;
        let program = self.handles.get(query.id);

        match self.backend.program_info(program, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }
}
