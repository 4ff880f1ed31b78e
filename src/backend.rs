//! The backend this binary serves.
//!
//! A deployment links the platform's real implementation by replacing
//! [`NullBackend`] with an adapter over its entry points. The null
//! backend exposes an empty machine: enumeration succeeds with no
//! platforms and every object operation reports the matching
//! invalid-object status.

use remotecl_server::{
    ImageDesc, ImageFormat, InfoResult, KernelArgKind, NativeBackend, NativeHandle, RectTransfer,
    Status,
};
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::status;

type NativeResult<T> = Result<T, Status>;

/// A backend with no platforms.
#[derive(Debug, Default)]
pub struct NullBackend;

impl NativeBackend for NullBackend {
    fn platform_ids(&self) -> NativeResult<Vec<NativeHandle>> {
        Ok(Vec::new())
    }

    fn platform_info(&self, _platform: NativeHandle, _param: u32) -> NativeResult<Vec<u8>> {
        Err(status::INVALID_PLATFORM)
    }

    fn device_ids(
        &self,
        _platform: NativeHandle,
        _device_type: u64,
    ) -> NativeResult<Vec<NativeHandle>> {
        Err(status::INVALID_PLATFORM)
    }

    fn device_info(&self, _device: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_DEVICE)
    }

    fn retain(&self, _kind: ObjectKind, _handle: NativeHandle) -> NativeResult<()> {
        Err(status::INVALID_VALUE)
    }

    fn release(&self, _kind: ObjectKind, _handle: NativeHandle) -> NativeResult<()> {
        Err(status::INVALID_VALUE)
    }

    fn create_context(
        &self,
        _properties: &[u64],
        _devices: &[NativeHandle],
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_DEVICE)
    }

    fn create_context_from_type(
        &self,
        _properties: &[u64],
        _device_type: u64,
    ) -> NativeResult<NativeHandle> {
        Err(status::DEVICE_NOT_FOUND)
    }

    fn context_info(&self, _context: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_CONTEXT)
    }

    fn supported_image_formats(
        &self,
        _context: NativeHandle,
        _flags: u32,
        _image_type: u32,
    ) -> NativeResult<Vec<ImageFormat>> {
        Err(status::INVALID_CONTEXT)
    }

    fn create_queue(
        &self,
        _context: NativeHandle,
        _device: NativeHandle,
        _properties: u32,
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn create_queue_with_properties(
        &self,
        _context: NativeHandle,
        _device: NativeHandle,
        _properties: &[u64],
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn queue_info(&self, _queue: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn flush(&self, _queue: NativeHandle) -> NativeResult<()> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn finish(&self, _queue: NativeHandle) -> NativeResult<()> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn create_program_with_source(
        &self,
        _context: NativeHandle,
        _source: &str,
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn create_program_with_binary(
        &self,
        _context: NativeHandle,
        _devices: &[NativeHandle],
        _binaries: &[Vec<u8>],
    ) -> NativeResult<(NativeHandle, Vec<Status>)> {
        Err(status::INVALID_CONTEXT)
    }

    fn build_program(
        &self,
        _program: NativeHandle,
        _devices: &[NativeHandle],
        _options: &str,
    ) -> NativeResult<()> {
        Err(status::INVALID_PROGRAM)
    }

    fn program_build_info(
        &self,
        _program: NativeHandle,
        _device: NativeHandle,
        _param: u32,
    ) -> NativeResult<Vec<u8>> {
        Err(status::INVALID_PROGRAM)
    }

    fn program_info(&self, _program: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_PROGRAM)
    }

    fn create_kernel(&self, _program: NativeHandle, _name: &str) -> NativeResult<NativeHandle> {
        Err(status::INVALID_PROGRAM)
    }

    fn create_kernels_in_program(
        &self,
        _program: NativeHandle,
    ) -> NativeResult<Vec<NativeHandle>> {
        Err(status::INVALID_PROGRAM)
    }

    fn clone_kernel(&self, _kernel: NativeHandle) -> NativeResult<NativeHandle> {
        Err(status::INVALID_KERNEL)
    }

    fn kernel_arg_kind(&self, _kernel: NativeHandle, _index: u32) -> NativeResult<KernelArgKind> {
        Err(status::INVALID_KERNEL)
    }

    fn set_kernel_arg_mem(
        &self,
        _kernel: NativeHandle,
        _index: u32,
        _mem: NativeHandle,
    ) -> NativeResult<()> {
        Err(status::INVALID_KERNEL)
    }

    fn set_kernel_arg_local(
        &self,
        _kernel: NativeHandle,
        _index: u32,
        _size: u32,
    ) -> NativeResult<()> {
        Err(status::INVALID_KERNEL)
    }

    fn set_kernel_arg_bytes(
        &self,
        _kernel: NativeHandle,
        _index: u32,
        _data: &[u8],
    ) -> NativeResult<()> {
        Err(status::INVALID_KERNEL)
    }

    fn kernel_info(&self, _kernel: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_KERNEL)
    }

    fn kernel_arg_info(
        &self,
        _kernel: NativeHandle,
        _index: u32,
        _param: u32,
    ) -> NativeResult<InfoResult> {
        Err(status::INVALID_KERNEL)
    }

    fn kernel_wg_info(
        &self,
        _kernel: NativeHandle,
        _device: NativeHandle,
        _param: u32,
    ) -> NativeResult<InfoResult> {
        Err(status::INVALID_KERNEL)
    }

    fn create_buffer(
        &self,
        _context: NativeHandle,
        _flags: u32,
        _size: usize,
        _host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn create_sub_buffer(
        &self,
        _buffer: NativeHandle,
        _flags: u32,
        _create_type: u32,
        _origin: usize,
        _size: usize,
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_MEM_OBJECT)
    }

    fn enqueue_read_buffer(
        &self,
        _queue: NativeHandle,
        _buffer: NativeHandle,
        _offset: usize,
        _size: usize,
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn enqueue_write_buffer(
        &self,
        _queue: NativeHandle,
        _buffer: NativeHandle,
        _blocking: bool,
        _offset: usize,
        _data: &[u8],
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn enqueue_read_buffer_rect(
        &self,
        _queue: NativeHandle,
        _buffer: NativeHandle,
        _rect: &RectTransfer,
        _out_size: usize,
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn enqueue_fill_buffer(
        &self,
        _queue: NativeHandle,
        _buffer: NativeHandle,
        _pattern: &[u8],
        _offset: usize,
        _size: usize,
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn mem_obj_info(&self, _mem: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_MEM_OBJECT)
    }

    fn create_image(
        &self,
        _context: NativeHandle,
        _flags: u32,
        _format: ImageFormat,
        _desc: ImageDesc,
        _host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn image_element_size(&self, _image: NativeHandle) -> NativeResult<usize> {
        Err(status::INVALID_MEM_OBJECT)
    }

    fn enqueue_read_image(
        &self,
        _queue: NativeHandle,
        _image: NativeHandle,
        _blocking: bool,
        _origin: [usize; 3],
        _region: [usize; 3],
        _row_pitch: usize,
        _slice_pitch: usize,
        _out_size: usize,
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn enqueue_write_image(
        &self,
        _queue: NativeHandle,
        _image: NativeHandle,
        _blocking: bool,
        _origin: [usize; 3],
        _region: [usize; 3],
        _row_pitch: usize,
        _slice_pitch: usize,
        _data: &[u8],
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn image_info(&self, _image: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_MEM_OBJECT)
    }

    fn enqueue_kernel(
        &self,
        _queue: NativeHandle,
        _kernel: NativeHandle,
        _work_dim: u8,
        _global_offset: [usize; 3],
        _global_size: [usize; 3],
        _local_size: Option<[usize; 3]>,
        _wait_list: &[NativeHandle],
        _want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        Err(status::INVALID_COMMAND_QUEUE)
    }

    fn create_user_event(&self, _context: NativeHandle) -> NativeResult<NativeHandle> {
        Err(status::INVALID_CONTEXT)
    }

    fn set_user_event_status(&self, _event: NativeHandle, _status: i32) -> NativeResult<()> {
        Err(status::INVALID_EVENT)
    }

    fn event_info(&self, _event: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Err(status::INVALID_EVENT)
    }

    fn event_profiling_info(&self, _event: NativeHandle, _param: u32) -> NativeResult<u64> {
        Err(status::INVALID_EVENT)
    }

    fn wait_for_events(&self, _events: &[NativeHandle]) -> NativeResult<()> {
        Err(status::INVALID_EVENT)
    }

    fn set_event_callback(
        &self,
        _event: NativeHandle,
        _callback_type: i32,
        _callback: Box<dyn FnOnce(i32) + Send>,
    ) -> NativeResult<()> {
        Err(status::INVALID_EVENT)
    }
}
