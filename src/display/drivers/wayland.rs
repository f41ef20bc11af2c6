//! Wayland full-screen client.
//!
//! Uses `wayland-client` and `libc` directly: one xdg-shell toplevel per
//! `wl_output`, made full-screen on that output, drawn into `wl_shm` buffers
//! backed by a memfd. The event loop polls the Wayland socket together with a
//! wake pipe so that `stop` can interrupt it from another thread.

use crate::colour::ChannelOrder;
use crate::display::driver::{DisplayConnector, FullscreenClient, OutputSurface, ScreenPainter};
use crate::display::output::{OutputInfo, Transform};
use crate::geometry::Size;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use std::ffi::{c_void, CString};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use wayland_client::{
    protocol::{wl_buffer, wl_compositor, wl_output, wl_registry, wl_shm, wl_shm_pool, wl_surface},
    Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum,
};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

const SHM_FORMAT: wl_shm::Format = wl_shm::Format::Argb8888;
const APP_ID: &str = "crash-reporter";

/// Connects to the compositor named by `WAYLAND_DISPLAY`/`WAYLAND_SOCKET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaylandDisplay;

impl DisplayConnector for WaylandDisplay {
    type Client = WaylandClient;

    fn connect(&self) -> Result<WaylandClient> {
        info!("Wayland: connecting to display...");
        let conn = Connection::connect_to_env().context("Wayland connection failed")?;
        WaylandClient::new(conn)
    }
}

/// A connected full-screen client. `run` may be called once per client.
#[derive(Debug)]
pub struct WaylandClient {
    conn: Connection,
    stop_requested: AtomicBool,
    wake_read: OwnedFd,
    wake_write: OwnedFd,
}

impl WaylandClient {
    pub fn new(conn: Connection) -> Result<Self> {
        let (wake_read, wake_write) = create_pipe().context("Failed to create wake pipe")?;
        Ok(Self {
            conn,
            stop_requested: AtomicBool::new(false),
            wake_read,
            wake_write,
        })
    }

    fn wait_for_events(&self, event_queue: &EventQueue<ClientState>) -> Result<()> {
        let Some(guard) = event_queue.prepare_read() else {
            // Events are already queued; dispatch them first.
            return Ok(());
        };

        let mut poll_fds = [
            libc::pollfd {
                fd: guard.connection_fd().as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.wake_read.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        // SAFETY: `poll_fds` is a valid array of two pollfd structs.
        let ret = unsafe { libc::poll(poll_fds.as_mut_ptr(), poll_fds.len() as libc::nfds_t, -1) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(anyhow!("Poll error: {}", err));
        }

        if poll_fds[0].revents & libc::POLLIN != 0 {
            if let Err(e) = guard.read() {
                match e {
                    wayland_client::backend::WaylandError::Io(ref io)
                        if io.kind() == std::io::ErrorKind::WouldBlock => {}
                    e => return Err(e).context("Wayland read error"),
                }
            }
        } else {
            // Dropping the guard cancels the read.
            drop(guard);
        }

        if poll_fds[1].revents & libc::POLLIN != 0 {
            let mut buf = [0u8; 64];
            // SAFETY: reading into a local buffer from our own non-blocking pipe.
            unsafe { libc::read(self.wake_read.as_raw_fd(), buf.as_mut_ptr() as *mut c_void, buf.len()) };
        }

        if poll_fds[0].revents & (libc::POLLHUP | libc::POLLERR) != 0 {
            return Err(anyhow!("Wayland connection closed"));
        }

        Ok(())
    }
}

impl FullscreenClient for WaylandClient {
    fn run(&self, painter: &dyn ScreenPainter) -> Result<()> {
        let mut event_queue = self.conn.new_event_queue::<ClientState>();
        let qh = event_queue.handle();
        let mut state = ClientState::default();

        let _registry = self.conn.display().get_registry(&qh, ());
        // First roundtrip binds globals, second collects output properties.
        event_queue
            .roundtrip(&mut state)
            .context("Wayland roundtrip failed while binding globals")?;
        event_queue
            .roundtrip(&mut state)
            .context("Wayland roundtrip failed while reading outputs")?;

        if state.compositor.is_none() {
            return Err(anyhow!("Missing wl_compositor"));
        }
        if state.shm.is_none() {
            return Err(anyhow!("Missing wl_shm"));
        }
        if state.wm_base.is_none() {
            return Err(anyhow!("Missing xdg_wm_base"));
        }

        info!("Wayland: event loop starting with {} output(s)", state.outputs.len());

        while !self.stop_requested.load(Ordering::SeqCst) {
            state.create_missing_surfaces(&qh);
            state.redraw(painter, &qh);

            event_queue
                .flush()
                .context("Failed to flush Wayland requests")?;
            self.wait_for_events(&event_queue)?;
            event_queue
                .dispatch_pending(&mut state)
                .context("Wayland dispatch error")?;
        }

        state.destroy_all();
        let _ = event_queue.flush();
        info!("Wayland: event loop stopped");
        Ok(())
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        let buf = [1u8];
        // SAFETY: writing one byte from a local buffer to our own pipe.
        let ret = unsafe { libc::write(self.wake_write.as_raw_fd(), buf.as_ptr() as *const c_void, 1) };
        if ret < 0 {
            // A full pipe already guarantees a wake-up.
            trace!("Wayland: wake pipe write failed: {}", std::io::Error::last_os_error());
        }
    }
}

// --- Helpers ---

fn create_pipe() -> Result<(OwnedFd, OwnedFd)> {
    let mut fds: [RawFd; 2] = [0; 2];
    // SAFETY: pipe2 fills `fds` with two fresh descriptors we take ownership of.
    unsafe {
        if libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok((OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])))
    }
}

fn create_memfd(size: usize) -> Result<OwnedFd> {
    let name = CString::new("crash-reporter-shm")?;
    // SAFETY: `name` is NUL-terminated; the returned descriptor is owned below.
    let fd = unsafe { libc::memfd_create(name.as_ptr(), libc::MFD_CLOEXEC) };
    if fd < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    // SAFETY: `fd` is a fresh descriptor nobody else owns.
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };
    // SAFETY: plain syscall on a descriptor we own.
    if unsafe { libc::ftruncate(fd, size as libc::off_t) } < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(owned)
}

/// A shared-memory mapping, unmapped on drop.
#[derive(Debug)]
struct ShmMap {
    ptr: *mut u8,
    len: usize,
}

impl ShmMap {
    fn new(fd: &OwnedFd, len: usize) -> Result<Self> {
        // SAFETY: maps `len` bytes of a memfd that was truncated to `len`.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: the mapping is `len` bytes, readable and writable, and lives
        // as long as `self`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for ShmMap {
    fn drop(&mut self) {
        if !self.ptr.is_null() && self.len > 0 {
            // SAFETY: unmapping exactly the region returned by mmap.
            unsafe { libc::munmap(self.ptr as *mut c_void, self.len) };
        }
    }
}

/// A `wl_buffer` and the memory behind it.
#[derive(Debug)]
struct ShmBuffer {
    buffer: wl_buffer::WlBuffer,
    map: ShmMap,
    size: Size,
}

impl ShmBuffer {
    fn create(shm: &wl_shm::WlShm, size: Size, qh: &QueueHandle<ClientState>) -> Result<Self> {
        let stride = size.stride();
        let len = stride * size.height as usize;
        let len_i32 = i32::try_from(len).map_err(|_| anyhow!("Buffer of {} bytes is too large", len))?;

        let fd = create_memfd(len).context("Failed to create memfd")?;
        let map = ShmMap::new(&fd, len).context("Failed to map shm buffer")?;

        let pool = shm.create_pool(fd.as_fd(), len_i32, qh, ());
        let buffer = pool.create_buffer(0, size.width, size.height, stride as i32, SHM_FORMAT, qh, ());
        // The buffer keeps the pool's memory alive.
        pool.destroy();

        Ok(Self { buffer, map, size })
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

// --- Client State ---

#[derive(Debug)]
struct ShellSurface {
    surface: wl_surface::WlSurface,
    xdg_surface: xdg_surface::XdgSurface,
    toplevel: xdg_toplevel::XdgToplevel,
}

impl Drop for ShellSurface {
    fn drop(&mut self) {
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
    }
}

#[derive(Debug)]
struct OutputSlot {
    global_name: u32,
    output: wl_output::WlOutput,
    /// Properties received since the last `done`.
    pending: OutputInfo,
    /// Properties as of the last `done`.
    info: Option<OutputInfo>,
    // Declared before `shell` so the buffer is destroyed before its surface.
    buffer: Option<ShmBuffer>,
    shell: Option<ShellSurface>,
    configured: bool,
    needs_redraw: bool,
}

impl OutputSlot {
    fn new(global_name: u32, output: wl_output::WlOutput) -> Self {
        Self {
            global_name,
            output,
            pending: OutputInfo::default(),
            info: None,
            buffer: None,
            shell: None,
            configured: false,
            needs_redraw: false,
        }
    }
}

#[derive(Debug, Default)]
struct ClientState {
    compositor: Option<wl_compositor::WlCompositor>,
    shm: Option<wl_shm::WlShm>,
    wm_base: Option<xdg_wm_base::XdgWmBase>,
    outputs: Vec<OutputSlot>,
}

impl ClientState {
    fn slot_mut(&mut self, global_name: u32) -> Option<&mut OutputSlot> {
        self.outputs.iter_mut().find(|slot| slot.global_name == global_name)
    }

    fn create_missing_surfaces(&mut self, qh: &QueueHandle<ClientState>) {
        let (Some(compositor), Some(wm_base)) = (&self.compositor, &self.wm_base) else {
            return;
        };

        for slot in self.outputs.iter_mut().filter(|slot| slot.info.is_some() && slot.shell.is_none()) {
            let surface = compositor.create_surface(qh, ());
            let xdg_surface = wm_base.get_xdg_surface(&surface, qh, slot.global_name);
            let toplevel = xdg_surface.get_toplevel(qh, slot.global_name);
            toplevel.set_app_id(APP_ID.to_string());
            toplevel.set_fullscreen(Some(&slot.output));
            surface.commit();

            debug!("Wayland: created full-screen surface for output {}", slot.global_name);
            slot.shell = Some(ShellSurface {
                surface,
                xdg_surface,
                toplevel,
            });
        }
    }

    fn redraw(&mut self, painter: &dyn ScreenPainter, qh: &QueueHandle<ClientState>) {
        let Some(shm) = &self.shm else {
            return;
        };

        for slot in self.outputs.iter_mut().filter(|slot| slot.configured && slot.needs_redraw) {
            slot.needs_redraw = false;
            let Some(info) = slot.info else {
                continue;
            };
            let Some(shell) = &slot.shell else {
                continue;
            };

            let mut surface = WaylandSurface {
                surface: &shell.surface,
                buffer: &mut slot.buffer,
                shm,
                qh,
            };
            trace!("Wayland: drawing output {} {:?}", slot.global_name, info);
            painter.draw_screen(&info, &mut surface);
        }
    }

    fn remove_output(&mut self, global_name: u32) {
        if let Some(index) = self.outputs.iter().position(|slot| slot.global_name == global_name) {
            let slot = self.outputs.remove(index);
            info!("Wayland: output {} removed", global_name);
            if slot.output.version() >= 3 {
                slot.output.release();
            }
        }
    }

    fn destroy_all(&mut self) {
        for slot in self.outputs.drain(..) {
            if slot.output.version() >= 3 {
                slot.output.release();
            }
        }
    }
}

/// The `OutputSurface` handed to the painter for one output.
struct WaylandSurface<'a> {
    surface: &'a wl_surface::WlSurface,
    buffer: &'a mut Option<ShmBuffer>,
    shm: &'a wl_shm::WlShm,
    qh: &'a QueueHandle<ClientState>,
}

impl OutputSurface for WaylandSurface<'_> {
    fn channel_order(&self) -> ChannelOrder {
        // ARGB8888 is a little-endian 32-bit word.
        ChannelOrder::Bgra
    }

    fn buffer(&mut self, size: Size) -> Result<&mut [u8]> {
        if size.area() == 0 {
            return Err(anyhow!("Cannot allocate a {}x{} buffer", size.width, size.height));
        }
        // Each frame gets a fresh buffer; the previous one is destroyed first.
        *self.buffer = None;
        let buffer = self.buffer.insert(ShmBuffer::create(self.shm, size, self.qh)?);
        Ok(buffer.map.as_mut_slice())
    }

    fn present(&mut self, scale_factor: i32) -> Result<()> {
        let buffer = self.buffer.as_ref().ok_or_else(|| anyhow!("Nothing to present"))?;
        self.surface.attach(Some(&buffer.buffer), 0, 0);
        if self.surface.version() >= 3 {
            self.surface.set_buffer_scale(scale_factor.max(1));
        }
        self.surface.damage(0, 0, buffer.size.width, buffer.size.height);
        self.surface.commit();
        Ok(())
    }
}

// --- Dispatch Implementations ---

impl Dispatch<wl_registry::WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                trace!("Wayland global: name={}, interface={}, version={}", name, interface, version);
                match interface.as_str() {
                    "wl_compositor" => {
                        // set_buffer_scale needs version 3.
                        let compositor = registry.bind::<wl_compositor::WlCompositor, _, _>(name, version.min(4), qh, ());
                        state.compositor = Some(compositor);
                    }
                    "wl_shm" => {
                        let shm = registry.bind::<wl_shm::WlShm, _, _>(name, version.min(1), qh, ());
                        state.shm = Some(shm);
                    }
                    "xdg_wm_base" => {
                        let wm_base = registry.bind::<xdg_wm_base::XdgWmBase, _, _>(name, version.min(1), qh, ());
                        state.wm_base = Some(wm_base);
                    }
                    "wl_output" => {
                        let output = registry.bind::<wl_output::WlOutput, _, _>(name, version.min(3), qh, name);
                        state.outputs.push(OutputSlot::new(name, output));
                    }
                    _ => {}
                }
            }
            wl_registry::Event::GlobalRemove { name } => state.remove_output(name),
            _ => {}
        }
    }
}

impl Dispatch<wl_output::WlOutput, u32> for ClientState {
    fn event(
        state: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        global_name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let Some(slot) = state.slot_mut(*global_name) else {
            return;
        };

        match event {
            wl_output::Event::Geometry { transform, .. } => match transform {
                WEnum::Value(transform) => {
                    slot.pending.transform = Transform::from_bits_truncate(transform as u32);
                }
                WEnum::Unknown(raw) => {
                    warn!("Wayland: output {} has unknown transform {}", global_name, raw);
                }
            },
            wl_output::Event::Mode { flags, width, height, .. } => {
                let current = flags
                    .into_result()
                    .map(|flags| flags.contains(wl_output::Mode::Current))
                    .unwrap_or(false);
                if current {
                    slot.pending.width = width;
                    slot.pending.height = height;
                }
            }
            wl_output::Event::Scale { factor } => {
                slot.pending.scale_factor = factor;
            }
            wl_output::Event::Done => {
                debug!("Wayland: output {} is {:?}", global_name, slot.pending);
                slot.info = Some(slot.pending);
                slot.needs_redraw = true;
            }
            _ => {}
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for ClientState {
    fn event(
        _: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, u32> for ClientState {
    fn event(
        state: &mut Self,
        xdg_surface: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        global_name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg_surface.ack_configure(serial);
            if let Some(slot) = state.slot_mut(*global_name) {
                slot.configured = true;
                slot.needs_redraw = true;
            }
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, u32> for ClientState {
    fn event(
        _: &mut Self,
        _: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        global_name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                trace!("Wayland: output {} toplevel configured {}x{}", global_name, width, height);
            }
            xdg_toplevel::Event::Close => {
                // The crash screen stays up until stopped by its owner.
                info!("Wayland: ignoring close request for output {}", global_name);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_compositor::WlCompositor,
        _: wl_compositor::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_surface::WlSurface,
        _: wl_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm::WlShm, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm::WlShm,
        _: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_shm_pool::WlShmPool,
        _: wl_shm_pool::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for ClientState {
    fn event(
        _: &mut Self,
        _: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            trace!("Wayland: buffer released");
        }
    }
}
