//! Kernel calls, including the argument-setting negotiation and enqueue.

use super::{read_info_reply, InfoReply};
use crate::connection::Connection;
use crate::error::ClientError;
use remotecl_protocol::packets::kernel::{
    arg_kind, CloneKernel, CreateKernel, CreateKernels, EnqueueKernel, KernelArg, KernelArgInfo,
    KernelInfo, KernelWGInfo,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::packets::{IdListPacket, IdPacket, SuccessPacket};
use remotecl_protocol::payload::{Payload, PayloadValue};
use remotecl_protocol::{status, ObjectId, NULL_ID};

/// Kernel parameter naming the owning context.
pub const KERNEL_CONTEXT: u32 = 0x1193;
/// Kernel parameter naming the parent program.
pub const KERNEL_PROGRAM: u32 = 0x1194;

/// What the caller supplies for a kernel argument. The server decides
/// which shape the argument actually needs; a mismatch is an invalid
/// argument value.
#[derive(Debug, Clone, Copy)]
pub enum KernelArgValue<'a> {
    /// A memory object (global or constant address space).
    Mem(ObjectId),
    /// A by-value argument's bytes.
    Data(&'a [u8]),
    /// No data: a local-memory argument, sized by `size`.
    Local,
}

impl Connection {
    pub async fn create_kernel(
        &self,
        program: ObjectId,
        name: &str,
    ) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateKernel {
                program,
                name: name.to_string(),
            })
            .await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Kernel);
        Ok(id.0)
    }

    /// Creates every kernel in a program.
    pub async fn create_kernels_in_program(
        &self,
        program: ObjectId,
        kernel_count: u32,
    ) -> Result<Vec<ObjectId>, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&CreateKernels {
                program,
                kernel_count,
            })
            .await?;
        state.stream.flush().await?;
        let list: IdListPacket = state.stream.recv().await?;
        for &id in &list.ids {
            state.registry.register(id, ObjectKind::Kernel);
        }
        Ok(list.ids)
    }

    pub async fn clone_kernel(&self, kernel: ObjectId) -> Result<ObjectId, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&CloneKernel(kernel)).await?;
        state.stream.flush().await?;
        let id: IdPacket = state.stream.recv().await?;
        state.registry.register(id.0, ObjectKind::Kernel);
        Ok(id.0)
    }

    /// Sets a kernel argument.
    ///
    /// The argument's type cannot be inferred from its size, so the
    /// server classifies it first and asks for an ID, a local-buffer
    /// size, or the raw bytes. When the caller's value does not fit the
    /// server's classification, a well-formed placeholder keeps the
    /// exchange intact and the call reports an invalid argument value.
    pub async fn set_kernel_arg(
        &self,
        kernel: ObjectId,
        arg_index: u32,
        size: usize,
        value: KernelArgValue<'_>,
    ) -> Result<(), ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&KernelArg { kernel, arg_index })
            .await?;
        state.stream.flush().await?;

        let discriminator: PayloadValue<u8> = state.stream.recv().await?;
        let mut mismatch = false;
        match discriminator.0 {
            arg_kind::MEM_OBJECT => {
                let id = match value {
                    KernelArgValue::Mem(id) => id,
                    _ => {
                        mismatch = true;
                        NULL_ID
                    }
                };
                state.stream.send(&IdPacket(id)).await?;
            }
            arg_kind::LOCAL => {
                state.stream.send(&PayloadValue(size as u32)).await?;
            }
            arg_kind::BY_VALUE => {
                let bytes = match value {
                    KernelArgValue::Data(data) => data.to_vec(),
                    _ => {
                        mismatch = true;
                        vec![0; size]
                    }
                };
                state.stream.send(&Payload::<u32>::new(bytes)).await?;
            }
            other => {
                tracing::error!(discriminator = other, "unknown kernel-arg discriminator");
                return Err(ClientError::InvalidArgument(status::INVALID_ARG_VALUE));
            }
        }
        state.stream.flush().await?;
        let result = state.stream.recv::<SuccessPacket>().await;

        if mismatch {
            return Err(ClientError::InvalidArgument(status::INVALID_ARG_VALUE));
        }
        result?;
        Ok(())
    }

    pub async fn kernel_info(
        &self,
        kernel: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state.stream.send(&KernelInfo { param, id: kernel }).await?;
        state.stream.flush().await?;
        let reply = read_info_reply(&mut state.stream).await?;
        if let InfoReply::Id(id) = reply {
            match param {
                KERNEL_CONTEXT => {
                    state.registry.get_or_insert(id, ObjectKind::Context);
                }
                KERNEL_PROGRAM => {
                    state.registry.get_or_insert(id, ObjectKind::Program);
                }
                _ => {}
            }
        }
        Ok(reply)
    }

    pub async fn kernel_arg_info(
        &self,
        kernel: ObjectId,
        arg_index: u32,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&KernelArgInfo {
                kernel,
                arg_index,
                param,
            })
            .await?;
        state.stream.flush().await?;
        read_info_reply(&mut state.stream).await
    }

    pub async fn kernel_wg_info(
        &self,
        kernel: ObjectId,
        device: ObjectId,
        param: u32,
    ) -> Result<InfoReply, ClientError> {
        let mut state = self.lock().await;
        state
            .stream
            .send(&KernelWGInfo {
                kernel,
                device,
                param,
            })
            .await?;
        state.stream.flush().await?;
        read_info_reply(&mut state.stream).await
    }

    /// Enqueues an N-dimensional kernel execution.
    ///
    /// The host API permits one to three work dimensions; anything else
    /// is rejected before a packet is sent. Returns the completion event
    /// when one was requested.
    #[allow(clippy::too_many_arguments)]
    pub async fn enqueue_kernel(
        &self,
        queue: ObjectId,
        kernel: ObjectId,
        work_dim: u8,
        global_offset: [u32; 3],
        global_size: [u32; 3],
        local_size: Option<[u32; 3]>,
        wait_events: &[ObjectId],
        want_event: bool,
    ) -> Result<Option<ObjectId>, ClientError> {
        if work_dim == 0 || work_dim > 3 {
            return Err(ClientError::InvalidArgument(status::INVALID_WORK_DIMENSION));
        }

        let mut state = self.lock().await;
        state
            .stream
            .send(&EnqueueKernel {
                kernel,
                queue,
                work_dim,
                global_size,
                global_offset,
                local_size: local_size.unwrap_or([0; 3]),
                want_event,
                expect_event_list: !wait_events.is_empty(),
            })
            .await?;
        if !wait_events.is_empty() {
            state
                .stream
                .send(&IdListPacket {
                    ids: wait_events.to_vec(),
                })
                .await?;
        }
        state.stream.flush().await?;

        let event = if want_event {
            let id: IdPacket = state.stream.recv().await?;
            state.registry.register(id.0, ObjectKind::Event);
            Some(id.0)
        } else {
            None
        };
        state.stream.recv::<SuccessPacket>().await?;
        Ok(event)
    }
}
