//! End-to-end sessions: a real client against a server backed by an
//! in-memory mock of the native implementation.

use remotecl_client::calls::KernelArgValue;
use remotecl_client::{ClientError, Connection, ObjectKind, MAP_WRITE};
use remotecl_protocol::status;
use remotecl_server::{
    ImageDesc, ImageFormat, InfoResult, KernelArgKind, NativeBackend, NativeHandle, RectTransfer,
    Server, ServerConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};

type NativeResult<T> = Result<T, i32>;

/// Device-type value the mock treats as invalid.
const BAD_DEVICE_TYPE: u64 = 0;

/// Bytes per pixel in every mock image.
const MOCK_PIXEL_SIZE: usize = 4;

#[derive(Default)]
struct MockState {
    buffers: HashMap<u64, Vec<u8>>,
    images: HashMap<u64, Vec<u8>>,
    kernel_args: Vec<(u64, u32)>,
    callbacks: Vec<(u64, Box<dyn FnOnce(i32) + Send>)>,
}

/// An in-memory stand-in for the native implementation: one platform,
/// one device, buffers and images with real storage.
struct MockBackend {
    platform: NativeHandle,
    device: NativeHandle,
    next_handle: AtomicU64,
    state: Mutex<MockState>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            platform: NativeHandle(0xA000),
            device: NativeHandle(0xB000),
            next_handle: AtomicU64::new(0x1000),
            state: Mutex::new(MockState::default()),
        }
    }

    fn fresh_handle(&self) -> NativeHandle {
        NativeHandle(self.next_handle.fetch_add(0x10, Ordering::SeqCst))
    }

    fn maybe_event(&self, want: bool) -> Option<NativeHandle> {
        want.then(|| self.fresh_handle())
    }
}

impl NativeBackend for MockBackend {
    fn platform_ids(&self) -> NativeResult<Vec<NativeHandle>> {
        Ok(vec![self.platform])
    }

    fn platform_info(&self, platform: NativeHandle, _param: u32) -> NativeResult<Vec<u8>> {
        if platform != self.platform {
            return Err(status::INVALID_PLATFORM);
        }
        Ok(b"remotecl mock platform\0".to_vec())
    }

    fn device_ids(
        &self,
        platform: NativeHandle,
        device_type: u64,
    ) -> NativeResult<Vec<NativeHandle>> {
        if platform != self.platform {
            return Err(status::INVALID_PLATFORM);
        }
        if device_type == BAD_DEVICE_TYPE {
            return Err(status::INVALID_DEVICE_TYPE);
        }
        Ok(vec![self.device])
    }

    fn device_info(&self, device: NativeHandle, param: u32) -> NativeResult<InfoResult> {
        if device != self.device {
            return Err(status::INVALID_DEVICE);
        }
        // The platform parameter is object-valued.
        if param == 0x1031 {
            return Ok(InfoResult::Handle(self.platform));
        }
        Ok(InfoResult::Bytes(b"mock device\0".to_vec()))
    }

    fn retain(&self, _kind: ObjectKind, _handle: NativeHandle) -> NativeResult<()> {
        Ok(())
    }

    fn release(&self, _kind: ObjectKind, _handle: NativeHandle) -> NativeResult<()> {
        Ok(())
    }

    fn create_context(
        &self,
        _properties: &[u64],
        devices: &[NativeHandle],
    ) -> NativeResult<NativeHandle> {
        if devices.iter().any(|&d| d != self.device) {
            return Err(status::INVALID_DEVICE);
        }
        Ok(self.fresh_handle())
    }

    fn create_context_from_type(
        &self,
        _properties: &[u64],
        device_type: u64,
    ) -> NativeResult<NativeHandle> {
        if device_type == BAD_DEVICE_TYPE {
            return Err(status::INVALID_DEVICE_TYPE);
        }
        Ok(self.fresh_handle())
    }

    fn context_info(&self, _context: NativeHandle, param: u32) -> NativeResult<InfoResult> {
        if param == 0x1081 {
            return Ok(InfoResult::Handles(vec![self.device]));
        }
        Ok(InfoResult::Bytes(1u32.to_le_bytes().to_vec()))
    }

    fn supported_image_formats(
        &self,
        _context: NativeHandle,
        _flags: u32,
        _image_type: u32,
    ) -> NativeResult<Vec<ImageFormat>> {
        Ok(vec![ImageFormat {
            channel_order: 0x10B5,
            channel_type: 0x10D2,
        }])
    }

    fn create_queue(
        &self,
        _context: NativeHandle,
        device: NativeHandle,
        _properties: u32,
    ) -> NativeResult<NativeHandle> {
        if device != self.device {
            return Err(status::INVALID_DEVICE);
        }
        Ok(self.fresh_handle())
    }

    fn create_queue_with_properties(
        &self,
        context: NativeHandle,
        device: NativeHandle,
        _properties: &[u64],
    ) -> NativeResult<NativeHandle> {
        self.create_queue(context, device, 0)
    }

    fn queue_info(&self, _queue: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes(Vec::new()))
    }

    fn flush(&self, _queue: NativeHandle) -> NativeResult<()> {
        Ok(())
    }

    fn finish(&self, _queue: NativeHandle) -> NativeResult<()> {
        Ok(())
    }

    fn create_program_with_source(
        &self,
        _context: NativeHandle,
        source: &str,
    ) -> NativeResult<NativeHandle> {
        if source.is_empty() {
            return Err(status::INVALID_VALUE);
        }
        Ok(self.fresh_handle())
    }

    fn create_program_with_binary(
        &self,
        _context: NativeHandle,
        devices: &[NativeHandle],
        binaries: &[Vec<u8>],
    ) -> NativeResult<(NativeHandle, Vec<i32>)> {
        if devices.len() != binaries.len() {
            return Err(status::INVALID_VALUE);
        }
        Ok((self.fresh_handle(), vec![status::SUCCESS; devices.len()]))
    }

    fn build_program(
        &self,
        _program: NativeHandle,
        _devices: &[NativeHandle],
        options: &str,
    ) -> NativeResult<()> {
        // The dispatch loop guarantees argument introspection stays
        // possible.
        assert!(options.contains("-cl-kernel-arg-info"));
        Ok(())
    }

    fn program_build_info(
        &self,
        _program: NativeHandle,
        _device: NativeHandle,
        _param: u32,
    ) -> NativeResult<Vec<u8>> {
        Ok(b"build ok\0".to_vec())
    }

    fn program_info(&self, _program: NativeHandle, param: u32) -> NativeResult<InfoResult> {
        if param == 0x1166 {
            return Ok(InfoResult::Binaries(vec![vec![0xDE, 0xAD], vec![0xBE]]));
        }
        Ok(InfoResult::Bytes(Vec::new()))
    }

    fn create_kernel(&self, _program: NativeHandle, name: &str) -> NativeResult<NativeHandle> {
        if name.is_empty() {
            return Err(status::INVALID_KERNEL_NAME);
        }
        Ok(self.fresh_handle())
    }

    fn create_kernels_in_program(&self, _program: NativeHandle) -> NativeResult<Vec<NativeHandle>> {
        Ok(vec![self.fresh_handle(), self.fresh_handle()])
    }

    fn clone_kernel(&self, _kernel: NativeHandle) -> NativeResult<NativeHandle> {
        Ok(self.fresh_handle())
    }

    fn kernel_arg_kind(&self, _kernel: NativeHandle, index: u32) -> NativeResult<KernelArgKind> {
        Ok(match index {
            0 => KernelArgKind::MemObject,
            1 => KernelArgKind::LocalBuffer,
            _ => KernelArgKind::ByValue,
        })
    }

    fn set_kernel_arg_mem(
        &self,
        kernel: NativeHandle,
        index: u32,
        mem: NativeHandle,
    ) -> NativeResult<()> {
        if !self.state.lock().unwrap().buffers.contains_key(&mem.0) {
            return Err(status::INVALID_MEM_OBJECT);
        }
        self.state.lock().unwrap().kernel_args.push((kernel.0, index));
        Ok(())
    }

    fn set_kernel_arg_local(
        &self,
        kernel: NativeHandle,
        index: u32,
        size: u32,
    ) -> NativeResult<()> {
        if size == 0 {
            return Err(status::INVALID_ARG_SIZE);
        }
        self.state.lock().unwrap().kernel_args.push((kernel.0, index));
        Ok(())
    }

    fn set_kernel_arg_bytes(
        &self,
        kernel: NativeHandle,
        index: u32,
        data: &[u8],
    ) -> NativeResult<()> {
        if data.is_empty() {
            return Err(status::INVALID_ARG_SIZE);
        }
        self.state.lock().unwrap().kernel_args.push((kernel.0, index));
        Ok(())
    }

    fn kernel_info(&self, _kernel: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes(2u32.to_le_bytes().to_vec()))
    }

    fn kernel_arg_info(
        &self,
        _kernel: NativeHandle,
        _index: u32,
        _param: u32,
    ) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes(b"float*\0".to_vec()))
    }

    fn kernel_wg_info(
        &self,
        _kernel: NativeHandle,
        _device: NativeHandle,
        _param: u32,
    ) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes(64u64.to_le_bytes().to_vec()))
    }

    fn create_buffer(
        &self,
        _context: NativeHandle,
        _flags: u32,
        size: usize,
        host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle> {
        let handle = self.fresh_handle();
        let mut data = vec![0u8; size];
        if let Some(init) = host_data {
            let len = init.len().min(size);
            data[..len].copy_from_slice(&init[..len]);
        }
        self.state.lock().unwrap().buffers.insert(handle.0, data);
        Ok(handle)
    }

    fn create_sub_buffer(
        &self,
        buffer: NativeHandle,
        _flags: u32,
        _create_type: u32,
        origin: usize,
        size: usize,
    ) -> NativeResult<NativeHandle> {
        let mut state = self.state.lock().unwrap();
        let parent = state
            .buffers
            .get(&buffer.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        if origin + size > parent.len() {
            return Err(status::INVALID_BUFFER_SIZE);
        }
        let data = parent[origin..origin + size].to_vec();
        let handle = self.fresh_handle();
        state.buffers.insert(handle.0, data);
        Ok(handle)
    }

    fn enqueue_read_buffer(
        &self,
        _queue: NativeHandle,
        buffer: NativeHandle,
        offset: usize,
        size: usize,
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        let state = self.state.lock().unwrap();
        let data = state
            .buffers
            .get(&buffer.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        if offset + size > data.len() {
            return Err(status::INVALID_VALUE);
        }
        let slice = data[offset..offset + size].to_vec();
        drop(state);
        Ok((slice, self.maybe_event(want_event)))
    }

    fn enqueue_write_buffer(
        &self,
        _queue: NativeHandle,
        buffer: NativeHandle,
        _blocking: bool,
        offset: usize,
        data: &[u8],
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        let mut state = self.state.lock().unwrap();
        let target = state
            .buffers
            .get_mut(&buffer.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        if offset + data.len() > target.len() {
            return Err(status::INVALID_VALUE);
        }
        target[offset..offset + data.len()].copy_from_slice(data);
        drop(state);
        Ok(self.maybe_event(want_event))
    }

    fn enqueue_read_buffer_rect(
        &self,
        queue: NativeHandle,
        buffer: NativeHandle,
        rect: &RectTransfer,
        out_size: usize,
        wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        // A single flat row is enough for the rect tests.
        let size = out_size.min(rect.region[0]);
        let (data, event) = self.enqueue_read_buffer(
            queue,
            buffer,
            rect.buffer_origin[0],
            size,
            wait_list,
            want_event,
        )?;
        let mut out = vec![0u8; out_size];
        out[..data.len()].copy_from_slice(&data);
        Ok((out, event))
    }

    fn enqueue_fill_buffer(
        &self,
        _queue: NativeHandle,
        buffer: NativeHandle,
        pattern: &[u8],
        offset: usize,
        size: usize,
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        let mut state = self.state.lock().unwrap();
        let target = state
            .buffers
            .get_mut(&buffer.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        if offset + size > target.len() || size % pattern.len() != 0 {
            return Err(status::INVALID_VALUE);
        }
        for (i, byte) in target[offset..offset + size].iter_mut().enumerate() {
            *byte = pattern[i % pattern.len()];
        }
        drop(state);
        Ok(self.maybe_event(want_event))
    }

    fn mem_obj_info(&self, mem: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        let state = self.state.lock().unwrap();
        let data = state
            .buffers
            .get(&mem.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        Ok(InfoResult::Bytes((data.len() as u64).to_le_bytes().to_vec()))
    }

    fn create_image(
        &self,
        _context: NativeHandle,
        _flags: u32,
        _format: ImageFormat,
        desc: ImageDesc,
        host_data: Option<&[u8]>,
    ) -> NativeResult<NativeHandle> {
        let w = desc.width.max(1) as usize;
        let h = desc.height.max(1) as usize;
        let d = desc.depth.max(1) as usize;
        let mut pixels = vec![0u8; w * h * d * MOCK_PIXEL_SIZE];
        if let Some(init) = host_data {
            let len = init.len().min(pixels.len());
            pixels[..len].copy_from_slice(&init[..len]);
        }
        let handle = self.fresh_handle();
        self.state.lock().unwrap().images.insert(handle.0, pixels);
        Ok(handle)
    }

    fn image_element_size(&self, image: NativeHandle) -> NativeResult<usize> {
        if !self.state.lock().unwrap().images.contains_key(&image.0) {
            return Err(status::INVALID_MEM_OBJECT);
        }
        Ok(MOCK_PIXEL_SIZE)
    }

    fn enqueue_read_image(
        &self,
        _queue: NativeHandle,
        image: NativeHandle,
        _blocking: bool,
        _origin: [usize; 3],
        _region: [usize; 3],
        _row_pitch: usize,
        _slice_pitch: usize,
        out_size: usize,
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<(Vec<u8>, Option<NativeHandle>)> {
        let state = self.state.lock().unwrap();
        let pixels = state.images.get(&image.0).ok_or(status::INVALID_MEM_OBJECT)?;
        if out_size > pixels.len() {
            return Err(status::INVALID_VALUE);
        }
        let data = pixels[..out_size].to_vec();
        drop(state);
        Ok((data, self.maybe_event(want_event)))
    }

    fn enqueue_write_image(
        &self,
        _queue: NativeHandle,
        image: NativeHandle,
        _blocking: bool,
        _origin: [usize; 3],
        _region: [usize; 3],
        _row_pitch: usize,
        _slice_pitch: usize,
        data: &[u8],
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        let mut state = self.state.lock().unwrap();
        let pixels = state
            .images
            .get_mut(&image.0)
            .ok_or(status::INVALID_MEM_OBJECT)?;
        if data.len() > pixels.len() {
            return Err(status::INVALID_VALUE);
        }
        pixels[..data.len()].copy_from_slice(data);
        drop(state);
        Ok(self.maybe_event(want_event))
    }

    fn image_info(&self, _image: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes((MOCK_PIXEL_SIZE as u64).to_le_bytes().to_vec()))
    }

    fn enqueue_kernel(
        &self,
        _queue: NativeHandle,
        _kernel: NativeHandle,
        work_dim: u8,
        _global_offset: [usize; 3],
        _global_size: [usize; 3],
        _local_size: Option<[usize; 3]>,
        _wait_list: &[NativeHandle],
        want_event: bool,
    ) -> NativeResult<Option<NativeHandle>> {
        if work_dim == 0 || work_dim > 3 {
            return Err(status::INVALID_WORK_DIMENSION);
        }
        Ok(self.maybe_event(want_event))
    }

    fn create_user_event(&self, _context: NativeHandle) -> NativeResult<NativeHandle> {
        Ok(self.fresh_handle())
    }

    fn set_user_event_status(&self, event: NativeHandle, new_status: i32) -> NativeResult<()> {
        // Fire the callbacks registered for this event.
        let fired: Vec<_> = {
            let mut state = self.state.lock().unwrap();
            let mut fired = Vec::new();
            let mut index = 0;
            while index < state.callbacks.len() {
                if state.callbacks[index].0 == event.0 {
                    fired.push(state.callbacks.remove(index).1);
                } else {
                    index += 1;
                }
            }
            fired
        };
        for callback in fired {
            callback(new_status);
        }
        Ok(())
    }

    fn event_info(&self, _event: NativeHandle, _param: u32) -> NativeResult<InfoResult> {
        Ok(InfoResult::Bytes(0i32.to_le_bytes().to_vec()))
    }

    fn event_profiling_info(&self, _event: NativeHandle, _param: u32) -> NativeResult<u64> {
        Ok(123_456_789)
    }

    fn wait_for_events(&self, events: &[NativeHandle]) -> NativeResult<()> {
        if events.is_empty() {
            return Err(status::INVALID_EVENT);
        }
        Ok(())
    }

    fn set_event_callback(
        &self,
        event: NativeHandle,
        _callback_type: i32,
        callback: Box<dyn FnOnce(i32) + Send>,
    ) -> NativeResult<()> {
        self.state.lock().unwrap().callbacks.push((event.0, callback));
        Ok(())
    }
}

/// Starts a server on an ephemeral port and connects a client to it.
async fn start_session() -> (Arc<Server<MockBackend>>, Connection) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Arc::new(Server::new(
        ServerConfig::new("127.0.0.1:0".parse().unwrap()),
        MockBackend::new(),
    ));
    let run = server.clone();
    tokio::spawn(async move {
        let _ = run.run_on(listener).await;
    });

    let socket = TcpStream::connect(addr).await.unwrap();
    let conn = Connection::handshake(socket, "127.0.0.1").await.unwrap();
    (server, conn)
}

fn remote_code(err: ClientError) -> i32 {
    assert!(err.is_remote(), "expected a remote error, got {err:?}");
    err.status_code()
}

#[tokio::test]
async fn platform_enumeration() {
    let (_server, conn) = start_session().await;

    let platforms = conn.platform_ids().await.unwrap();
    assert_eq!(platforms.len(), 1);

    // The proxy was registered and doubles as an opaque handle.
    {
        let state = conn.lock().await;
        let proxy = state
            .registry
            .get(platforms[0], ObjectKind::Platform)
            .unwrap();
        assert_eq!(proxy.id(), platforms[0]);
    }

    let info = conn.platform_info(platforms[0], 0x0902).await.unwrap();
    assert_eq!(info, b"remotecl mock platform\0");
}

#[tokio::test]
async fn ids_are_stable_across_queries() {
    let (_server, conn) = start_session().await;

    let first = conn.platform_ids().await.unwrap();
    let second = conn.platform_ids().await.unwrap();
    assert_eq!(first, second);

    let platform = first[0];
    let devices_a = conn.device_ids(platform, 1 << 2).await.unwrap();
    let devices_b = conn.device_ids(platform, 1 << 2).await.unwrap();
    assert_eq!(devices_a, devices_b);
    assert_ne!(devices_a[0], platform);
}

#[tokio::test]
async fn remote_error_propagation() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];

    let err = conn.device_ids(platform, BAD_DEVICE_TYPE).await.unwrap_err();
    assert_eq!(remote_code(err), status::INVALID_DEVICE_TYPE);

    // Exactly one tag+body was consumed: the connection stays usable.
    let devices = conn.device_ids(platform, 1 << 2).await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn blocking_buffer_read() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();

    let buffer = conn
        .create_buffer(context, 0, 4, Some(&[9, 8, 7, 6]))
        .await
        .unwrap();

    let (data, event) = conn.read_buffer(queue, buffer, 0, 4, &[], false).await.unwrap();
    assert_eq!(data, [9, 8, 7, 6]);
    assert_eq!(event, None);
}

#[tokio::test]
async fn write_then_read_roundtrip() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();
    let buffer = conn.create_buffer(context, 0, 8, None).await.unwrap();

    conn.write_buffer(queue, buffer, 2, &[1, 2, 3], true, &[], false)
        .await
        .unwrap();
    let (data, _) = conn.read_buffer(queue, buffer, 0, 8, &[], false).await.unwrap();
    assert_eq!(data, [0, 0, 1, 2, 3, 0, 0, 0]);

    // A requested completion event comes back before the payload.
    let (_, event) = conn.read_buffer(queue, buffer, 0, 4, &[], true).await.unwrap();
    let event = event.unwrap();
    conn.wait_for_events(&[event]).await.unwrap();
}

#[tokio::test]
async fn fill_buffer_repeats_the_pattern() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();
    let buffer = conn.create_buffer(context, 0, 8, None).await.unwrap();

    conn.fill_buffer(queue, buffer, &[0xAB, 0xCD], 0, 8, &[], false)
        .await
        .unwrap();
    let (data, _) = conn.read_buffer(queue, buffer, 0, 8, &[], false).await.unwrap();
    assert_eq!(data, [0xAB, 0xCD, 0xAB, 0xCD, 0xAB, 0xCD, 0xAB, 0xCD]);

    // Oversized patterns are rejected before any packet is sent.
    let err = conn
        .fill_buffer(queue, buffer, &[0u8; 200], 0, 8, &[], false)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), status::INVALID_VALUE);
}

#[tokio::test]
async fn kernel_argument_negotiation() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();

    let program = conn
        .create_program_with_source(context, "__kernel void k() {}")
        .await
        .unwrap();
    conn.build_program(program, vec![device], "").await.unwrap();
    let kernel = conn.create_kernel(program, "k").await.unwrap();

    let buffer = conn.create_buffer(context, 0, 16, None).await.unwrap();

    // Argument 0 is a memory object: the server asks for an ID.
    conn.set_kernel_arg(kernel, 0, 8, KernelArgValue::Mem(buffer))
        .await
        .unwrap();

    // Argument 1 is local memory: only a size travels.
    conn.set_kernel_arg(kernel, 1, 256, KernelArgValue::Local)
        .await
        .unwrap();

    // Argument 2 is by-value: the bytes travel as a payload.
    conn.set_kernel_arg(kernel, 2, 4, KernelArgValue::Data(&42u32.to_le_bytes()))
        .await
        .unwrap();
}

#[tokio::test]
async fn enqueue_kernel_validates_work_dim() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();
    let program = conn
        .create_program_with_source(context, "__kernel void k() {}")
        .await
        .unwrap();
    conn.build_program(program, vec![device], "").await.unwrap();
    let kernel = conn.create_kernel(program, "k").await.unwrap();

    // Three dimensions are permitted.
    let event = conn
        .enqueue_kernel(queue, kernel, 3, [0; 3], [8, 8, 8], None, &[], true)
        .await
        .unwrap();
    assert!(event.is_some());

    // Zero and four are not; no packet is sent.
    for dim in [0u8, 4] {
        let err = conn
            .enqueue_kernel(queue, kernel, dim, [0; 3], [8, 8, 8], None, &[], false)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), status::INVALID_WORK_DIMENSION);
    }
}

#[tokio::test]
async fn mapping_roundtrip_flushes_writes() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();
    let buffer = conn.create_buffer(context, 0, 4, None).await.unwrap();

    let token = conn
        .map_buffer(queue, buffer, MAP_WRITE, 0, 4)
        .await
        .unwrap();
    conn.write_mapping(buffer, token, &[4, 3, 2, 1]).await.unwrap();
    conn.unmap_buffer(queue, buffer, token).await.unwrap();

    let (data, _) = conn.read_buffer(queue, buffer, 0, 4, &[], false).await.unwrap();
    assert_eq!(data, [4, 3, 2, 1]);

    // Zero-length mappings are accepted and unmap cleanly.
    let token = conn.map_buffer(queue, buffer, MAP_WRITE, 0, 0).await.unwrap();
    conn.unmap_buffer(queue, buffer, token).await.unwrap();
}

#[tokio::test]
async fn image_write_and_read() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let queue = conn.create_queue(context, device, 0).await.unwrap();

    let image = conn
        .create_image(context, 0, 0x10B5, 0x10D2, 0x10F1, [2, 2, 1], None)
        .await
        .unwrap();

    // 2x2 pixels at 4 bytes each: the server dictates the 16-byte count.
    let pixels: Vec<u8> = (0u8..16).collect();
    conn.write_image(queue, image, [0; 3], [2, 2, 1], 0, 0, &pixels, &[], true, false)
        .await
        .unwrap();

    let (data, _) = conn
        .read_image(queue, image, [0; 3], [2, 2, 1], 0, 0, &[], false)
        .await
        .unwrap();
    assert_eq!(data, pixels);

    // Host-copy creation: the server dictates the byte count and the
    // pixels travel before the image ID comes back.
    let seeded = conn
        .create_image(
            context,
            remotecl_client::calls::image::MEM_COPY_HOST_PTR,
            0x10B5,
            0x10D2,
            0x10F1,
            [2, 2, 1],
            Some(&pixels),
        )
        .await
        .unwrap();
    let (data, _) = conn
        .read_image(queue, seeded, [0; 3], [2, 2, 1], 0, 0, &[], false)
        .await
        .unwrap();
    assert_eq!(data, pixels);
}

#[tokio::test]
async fn program_binaries_reply() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let program = conn
        .create_program_with_source(context, "__kernel void k() {}")
        .await
        .unwrap();

    let reply = conn
        .program_info(program, remotecl_client::calls::program::PROGRAM_BINARIES)
        .await
        .unwrap();
    match reply {
        remotecl_client::InfoReply::Binaries(binaries) => {
            assert_eq!(binaries, vec![vec![0xDE, 0xAD], vec![0xBE]]);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn object_valued_info_registers_proxies() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();

    let reply = conn.context_info(context, 0x1081).await.unwrap();
    match reply {
        remotecl_client::InfoReply::Ids(ids) => assert_eq!(ids, vec![device]),
        other => panic!("unexpected reply: {other:?}"),
    }

    let reply = conn.device_info(device, 0x1031).await.unwrap();
    assert_eq!(reply, remotecl_client::InfoReply::Id(platform));
}

#[tokio::test]
async fn event_callback_delivery() {
    let (_server, conn) = start_session().await;
    assert!(conn.event_stream_alive());

    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();
    let event = conn.create_user_event(context).await.unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    conn.register_event_callback(
        event,
        0,
        Box::new(move |exec_status| {
            let _ = tx.send(exec_status);
        }),
    )
    .await
    .unwrap();

    conn.set_user_event_status(event, status::execution::COMPLETE)
        .await
        .unwrap();

    let delivered = tokio::time::timeout(std::time::Duration::from_secs(5), rx)
        .await
        .expect("callback was not delivered")
        .unwrap();
    assert_eq!(delivered, status::execution::COMPLETE);
}

#[tokio::test]
async fn graceful_shutdown() {
    let (server, conn) = start_session().await;

    conn.platform_ids().await.unwrap();
    conn.close().await;

    // The dispatch loop exits on the terminate packet and the connection
    // winds down without surfacing an error.
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if server.stats().connections_active.load(Ordering::SeqCst) == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection did not wind down");

    assert_eq!(server.stats().errors_total.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refcount_forwarding() {
    let (_server, conn) = start_session().await;
    let platform = conn.platform_ids().await.unwrap()[0];
    let device = conn.device_ids(platform, 1 << 2).await.unwrap()[0];
    let context = conn.create_context(vec![], vec![device]).await.unwrap();

    conn.retain(ObjectKind::Context, context).await.unwrap();
    conn.release(ObjectKind::Context, context).await.unwrap();

    // Platforms are not reference counted.
    let err = conn.retain(ObjectKind::Platform, platform).await.unwrap_err();
    assert_eq!(err.status_code(), status::INVALID_VALUE);
}

#[tokio::test]
async fn incompatible_server_version_is_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut stream = remotecl_protocol::ByteStream::from_tcp(socket);
        // A version packet with a different ID width.
        let mut raw = [0u8; 64];
        raw[0] = remotecl_protocol::VERSION_MAJOR;
        raw[1] = remotecl_protocol::VERSION_MINOR;
        raw[2] = b' ';
        raw[3] = 4;
        raw[4] = b'z';
        stream.write_u8(remotecl_protocol::PacketTag::Version as u8).await.unwrap();
        stream.write_all(&raw).await.unwrap();
        stream.flush().await.unwrap();
        // Hold the socket open until the client gives up.
        let _ = stream.peek().await;
    });

    let socket = TcpStream::connect(addr).await.unwrap();
    let err = Connection::handshake(socket, "127.0.0.1").await.unwrap_err();
    assert_eq!(err.status_code(), status::DEVICE_NOT_AVAILABLE);
}
