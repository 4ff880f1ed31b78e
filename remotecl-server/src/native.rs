//! The interface the dispatch loop consumes from the native implementation.
//!
//! The server process links against a real host-API implementation; this
//! trait is the seam between the protocol core and that implementation,
//! and the only thing tests need to fake. Every method mirrors one native
//! entry point (or the small introspection cluster a handler needs),
//! takes opaque handles, and fails with the host API's status code.

use remotecl_protocol::packets::refcount::ObjectKind;

/// A host-API status code.
pub type Status = i32;

pub type NativeResult<T> = Result<T, Status>;

/// An opaque native object handle.
///
/// On a real backend this is the pointer value of the underlying object;
/// the null handle stands in for absent optional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The result of an info query.
///
/// Object-valued parameters return handles so the dispatch loop can map
/// them into the connection's ID space; everything else is returned as the
/// raw bytes the native call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoResult {
    Bytes(Vec<u8>),
    Handle(NativeHandle),
    Handles(Vec<NativeHandle>),
    /// Program binaries, one blob per device.
    Binaries(Vec<Vec<u8>>),
}

/// The address-space classification of a kernel argument, which decides
/// what the client must send to set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArgKind {
    /// Global or constant memory: the client sends a memory-object ID.
    MemObject,
    /// Local memory: the client sends a byte count.
    LocalBuffer,
    /// Private by-value: the client sends the bytes themselves.
    ByValue,
}

/// An image channel layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageFormat {
    pub channel_order: u32,
    pub channel_type: u32,
}

/// An image shape description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageDesc {
    pub image_type: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub row_pitch: u32,
    pub slice_pitch: u32,
    pub mip_levels: u32,
    pub samples: u32,
}

/// Geometry of a rectangular buffer transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectTransfer {
    pub buffer_origin: [usize; 3],
    pub host_origin: [usize; 3],
    pub region: [usize; 3],
    pub buffer_row_pitch: usize,
    pub buffer_slice_pitch: usize,
    pub host_row_pitch: usize,
    pub host_slice_pitch: usize,
}

/// Well-known host-API constants the dispatch loop itself interprets.
pub mod constants {
    /// Context property naming a platform; its value slot carries an
    /// object ID on the wire and must be translated back to a handle.
    pub const CONTEXT_PLATFORM: u64 = 0x1084;

    /// Memory flag requesting a copy of host memory at creation.
    pub const MEM_COPY_HOST_PTR: u32 = 1 << 5;
}

/// The native implementation the server re-issues requests against.
///
/// Implementations are shared across connections and called from
/// concurrent connection tasks; interior synchronization is theirs to
/// provide (real host APIs are thread-safe by specification).
pub trait NativeBackend: Send + Sync + 'static {
    // Platforms and devices.
    fn platform_ids(&self) -> NativeResult<Vec<NativeHandle>>;
    fn platform_info(&self, platform: NativeHandle, param: u32) -> NativeResult<Vec<u8>>;
    fn device_ids(&self, platform: NativeHandle, device_type: u64)
        -> NativeResult<Vec<NativeHandle>>;
    fn device_info(&self, device: NativeHandle, param: u32) -> NativeResult<InfoResult>;

    // Reference counting.
    fn retain(&self, kind: ObjectKind, handle: NativeHandle) -> NativeResult<()>;
    fn release(&self, kind: ObjectKind, handle: NativeHandle) -> NativeResult<()>;

    // Contexts.
    fn create_context(
        &self,
        properties: &[u64],
        devices: &[NativeHandle],
    ) -> NativeResult<NativeHandle>;
    fn create_context_from_type(
        &self,
        properties: &[u64],
        device_type: u64,
    ) -> NativeResult<NativeHandle>;
    fn context_info(&self, context: NativeHandle, param: u32) -> NativeResult<InfoResult>;
    fn supported_image_formats(
        &self,
        context: NativeHandle,
        flags: u32,
        image_type: u32,
    ) -> NativeResult<Vec<ImageFormat>>;

    // Queues.
    fn create_queue(
        &self,
        context: NativeHandle,
        device: NativeHandle,
        properties: u32,
    ) -> NativeResult<NativeHandle>;
    fn create_queue_with_properties(
        &self,
        context: NativeHandle,
        device: NativeHandle,
        properties: &[u64],
    ) -> NativeResult<NativeHandle>;
    fn queue_info(&self, queue: NativeHandle, param: u32) -> NativeResult<InfoResult>;
    fn flush(&self, queue: NativeHandle) -> NativeResult<()>;
    fn finish(&self, queue: NativeHandle) -> NativeResult<()>;

    // Programs.
    fn create_program_with_source(
        &self,
        context: NativeHandle,
        source: &str,
    ) -> NativeResult<NativeHandle>;
    fn create_program_with_binary(
        &self,
        context: NativeHandle,
        devices: &[NativeHandle],
        binaries: &[Vec<u8>],
    ) -> NativeResult<(NativeHandle, Vec<Status>)>;
    fn build_program(
        &self,
        program: NativeHandle,
        devices: &[NativeHandle],
        options: &str,
    ) -> NativeResult<()>;
    fn program_build_info(
        &self,
        program: NativeHandle,
        device: NativeHandle,
        param: u32,
    ) -> NativeResult<Vec<u8>>;
    fn program_info(&self, program: NativeHandle, param: u32) -> NativeResult<InfoResult>;

    // Kernels.
    fn create_kernel(&self, program: NativeHandle, name: &str) -> NativeResult<NativeHandle>;
    fn create_kernels_in_program(&self, program: NativeHandle)
        -> NativeResult<Vec<NativeHandle>>;
    fn clone_kernel(&self, kernel: NativeHandle) -> NativeResult<NativeHandle>;
    fn kernel_arg_kind(&self, kernel: NativeHandle, index: u32) -> NativeResult<KernelArgKind>;
    fn set_kernel_arg_mem(
        &self,
        kernel: NativeHandle,
        index: u32,
        mem: NativeHandle,
    ) -> NativeResult<()>;
    fn set_kernel_arg_local(&self, kernel: NativeHandle, index: u32, size: u32)
        -> NativeResult<()>;
    fn set_kernel_arg_bytes(&self, kernel: NativeHandle, index: u32, data: &[u8])
        -> NativeResult<()>;
    fn kernel_info(&self, kernel: NativeHandle, param: u32) -> NativeResult<InfoResult>;
    fn kernel_arg_info(
        &self,
        kernel: NativeHandle,
        index: u32,
        param: u32,
    ) -> NativeResult<InfoResult>;
    fn kernel_wg_info(
        &self,
        kernel: NativeHandle,
        device: NativeHandle,
        param: u32,
    ) -> NativeResult<InfoResult>;

    // Buffers.
    fn create_buffer(
        &self,
        context: NativeHandle,
        flags: u32,
        size: usize,
        host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle>;
    fn create_sub_buffer(
        &self,
        buffer: NativeHandle,
        flags: u32,
        create_type: u32,
        origin: usize,
        size: usize,
    ) -> NativeResult<NativeHandle>;
    #[allow(clippy::too_many_arguments)]
    fn enqueue_read_buffer(
        &self,
        queue: NativeHandle,
        buffer: NativeHandle,
        offset: usize,
        size: usize,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)>;
    #[allow(clippy::too_many_arguments)]
    fn enqueue_write_buffer(
        &self,
        queue: NativeHandle,
        buffer: NativeHandle,
        blocking: bool,
        offset: usize,
        data: &[u8],
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>>;
    fn enqueue_read_buffer_rect(
        &self,
        queue: NativeHandle,
        buffer: NativeHandle,
        rect: &RectTransfer,
        out_size: usize,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)>;
    #[allow(clippy::too_many_arguments)]
    fn enqueue_fill_buffer(
        &self,
        queue: NativeHandle,
        buffer: NativeHandle,
        pattern: &[u8],
        offset: usize,
        size: usize,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>>;
    fn mem_obj_info(&self, mem: NativeHandle, param: u32) -> NativeResult<InfoResult>;

    // Images.
    fn create_image(
        &self,
        context: NativeHandle,
        flags: u32,
        format: ImageFormat,
        desc: ImageDesc,
        host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle>;
    fn image_element_size(&self, image: NativeHandle) -> NativeResult<usize>;
    #[allow(clippy::too_many_arguments)]
    fn enqueue_read_image(
        &self,
        queue: NativeHandle,
        image: NativeHandle,
        blocking: bool,
        origin: [usize; 3],
        region: [usize; 3],
        row_pitch: usize,
        slice_pitch: usize,
        out_size: usize,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)>;
    #[allow(clippy::too_many_arguments)]
    fn enqueue_write_image(
        &self,
        queue: NativeHandle,
        image: NativeHandle,
        blocking: bool,
        origin: [usize; 3],
        region: [usize; 3],
        row_pitch: usize,
        slice_pitch: usize,
        data: &[u8],
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>>;
    fn image_info(&self, image: NativeHandle, param: u32) -> NativeResult<InfoResult>;

    // Commands.
    #[allow(clippy::too_many_arguments)]
    fn enqueue_kernel(
        &self,
        queue: NativeHandle,
        kernel: NativeHandle,
        work_dim: u8,
        global_offset: [usize; 3],
        global_size: [usize; 3],
        local_size: Option<[usize; 3]>,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>>;

    // Events.
    fn create_user_event(&self, context: NativeHandle) -> NativeResult<NativeHandle>;
    fn set_user_event_status(&self, event: NativeHandle, status: i32) -> NativeResult<()>;
    fn event_info(&self, event: NativeHandle, param: u32) -> NativeResult<InfoResult>;
    fn event_profiling_info(&self, event: NativeHandle, param: u32) -> NativeResult<u64>;
    fn wait_for_events(&self, events: &[NativeHandle]) -> NativeResult<()>;

    /// Registers a native completion callback. The callback may fire from
    /// any thread; it receives the command execution status.
    fn set_event_callback(
        &self,
        event: NativeHandle,
        callback_type: i32,
        callback: Box<dyn FnOnce(i32) + Send>,
    ) -> NativeResult<()>;
}
