//! Kernel handlers, including the argument-setting negotiation and
//! kernel enqueue.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::{KernelArgKind, NativeBackend};
use remotecl_protocol::packets::kernel::{
    arg_kind, CloneKernel, CreateKernel, CreateKernels, EnqueueKernel, KernelArg, KernelArgInfo,
    KernelInfo, KernelWGInfo,
};
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::{Payload, PayloadValue};

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn create_kernel(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateKernel>().await?;
        let program = self.handles.get(packet.program);

        match self.backend.create_kernel(program, &packet.name) {
            Ok(kernel) => {
                let id = self.handles.id_for(kernel)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn create_kernels(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CreateKernels>().await?;
        let program = self.handles.get(packet.program);

        match self.backend.create_kernels_in_program(program) {
            Ok(kernels) => {
                let ids = self.ids_for(&kernels)?;
                self.stream.send(&IdListPacket { ids }).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn clone_kernel(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<CloneKernel>().await?;
        let kernel = self.handles.get(packet.0);

        match self.backend.clone_kernel(kernel) {
            Ok(clone) => {
                let id = self.handles.id_for(clone)?;
                self.stream.send(&IdPacket(id)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    /// The only in-call two-round exchange. The argument's type cannot be
    /// inferred from its size alone, so the server classifies it via
    /// native introspection and tells the client what to send.
    pub(crate) async fn set_kernel_arg(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<KernelArg>().await?;
        let kernel = self.handles.get(packet.kernel);

        let kind = match self.backend.kernel_arg_kind(kernel, packet.arg_index) {
            Ok(kind) => kind,
            Err(code) => return self.reply_error(code).await,
        };

        let result = match kind {
            KernelArgKind::MemObject => {
                self.stream.send(&PayloadValue(arg_kind::MEM_OBJECT)).await?;
                self.stream.flush().await?;
                let arg: IdPacket = self.stream.recv().await?;
                let mem = self.handles.get(arg.0);
                self.backend.set_kernel_arg_mem(kernel, packet.arg_index, mem)
            }
            KernelArgKind::LocalBuffer => {
                self.stream.send(&PayloadValue(arg_kind::LOCAL)).await?;
                self.stream.flush().await?;
                let size: PayloadValue<u32> = self.stream.recv().await?;
                self.backend
                    .set_kernel_arg_local(kernel, packet.arg_index, size.0)
            }
            KernelArgKind::ByValue => {
                self.stream.send(&PayloadValue(arg_kind::BY_VALUE)).await?;
                self.stream.flush().await?;
                let value: Payload = self.stream.recv().await?;
                self.backend
                    .set_kernel_arg_bytes(kernel, packet.arg_index, &value.data)
            }
        };

        match result {
            Ok(()) => {
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_kernel_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<KernelInfo>().await?;
        let kernel = self.handles.get(query.id);

        match self.backend.kernel_info(kernel, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_kernel_arg_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<KernelArgInfo>().await?;
        let kernel = self.handles.get(query.kernel);

        match self
            .backend
            .kernel_arg_info(kernel, query.arg_index, query.param)
        {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn get_kernel_wg_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<KernelWGInfo>().await?;
        let kernel = self.handles.get(query.kernel);
        let device = self.handles.get(query.device);

        match self.backend.kernel_wg_info(kernel, device, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }

    pub(crate) async fn enqueue_kernel(&mut self) -> Result<(), ServerError> {
        let packet = self.stream.recv::<EnqueueKernel>().await?;
        let wait_list = self.read_wait_list(packet.expect_event_list).await?;

        let kernel = self.handles.get(packet.kernel);
        let queue = self.handles.get(packet.queue);

        let to_usize = |a: [u32; 3]| [a[0] as usize, a[1] as usize, a[2] as usize];
        // A zero leading local size means the client left the work-group
        // size to the implementation.
        let local_size = if packet.local_size[0] == 0 {
            None
        } else {
            Some(to_usize(packet.local_size))
        };

        let result = self.backend.enqueue_kernel(
            queue,
            kernel,
            packet.work_dim,
            to_usize(packet.global_offset),
            to_usize(packet.global_size),
            local_size,
            &wait_list,
            packet.want_event,
        );

        match result {
            Ok(event) => {
                self.reply_event(event).await?;
                self.stream.send(&SuccessPacket).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }
}
