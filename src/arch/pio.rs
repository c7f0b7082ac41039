/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Backend for programmable I/O blocks (RP2040-style PIO).
//!
//! A four-instruction program waits for VSYNC, then samples the eight
//! data lines on every rising PCLK edge and pushes each byte to the RX
//! FIFO. VSYNC and PCLK pin numbers are encoded in the WAIT instructions,
//! so the program is kept as a template and patched for the configured
//! pins before loading. The data lines must be contiguous because they
//! are read as one `IN PINS, 8` group.

use super::{
    frame_slice, wait_level, Arch, ClockGenerator, ClockSetting, Deadline,
    GpioBank, SyncMasks,
};
use crate::config::{Config, PinAssignment, DATA_PINS};
use crate::error::{ArchError, CaptureError};

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// Number of PIO blocks searched for free resources, in order
pub const PIO_BLOCKS: usize = 2;
/// State machines per block
pub const STATE_MACHINES: u8 = 4;
/// Instruction memory words per block
pub const INSTRUCTION_MEMORY: u8 = 32;

/// GPIO index field of a WAIT instruction
const WAIT_INDEX_MASK: u16 = 0b1_1111;

/// Pin whose number is filled into an instruction at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Vsync,
    Pclk,
}

impl PinRole {
    fn pin(self, pins: &PinAssignment) -> u8 {
        match self {
            PinRole::Vsync => pins.vsync,
            PinRole::Pclk => pins.pclk,
        }
    }
}

/// One instruction slot of a program template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fixed(u16),
    /// Opcode with its GPIO index field left for `PinRole`
    Pin(u16, PinRole),
}

/// Program with instruction slots parameterized by pin number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramTemplate<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> ProgramTemplate<N> {
    pub const fn new(slots: [Slot; N]) -> Self {
        Self { slots }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Instruction words for `pins`; the template itself is never modified
    pub fn patch(&self, pins: &PinAssignment) -> [u16; N] {
        let mut program = [0u16; N];
        for (word, slot) in program.iter_mut().zip(self.slots.iter()) {
            *word = match *slot {
                Slot::Fixed(op) => op,
                Slot::Pin(op, role) => {
                    op | (u16::from(role.pin(pins)) & WAIT_INDEX_MASK)
                }
            };
        }
        program
    }
}

/// Sampling program: one byte per PCLK rising edge while VSYNC is high
pub const CAPTURE_PROGRAM: ProgramTemplate<4> = ProgramTemplate::new([
    Slot::Pin(0b0010_0000_1000_0000, PinRole::Vsync), // WAIT 1 GPIO vsync
    Slot::Pin(0b0010_0000_1000_0000, PinRole::Pclk),  // WAIT 1 GPIO pclk
    Slot::Fixed(0b0100_0000_0000_1000),               // IN PINS 8
    Slot::Pin(0b0010_0000_0000_0000, PinRole::Pclk),  // WAIT 0 GPIO pclk
]);

/// State machine and instruction memory held by one capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PioClaim {
    pub block: u8,
    pub sm: u8,
    /// First instruction memory word of the loaded program
    pub offset: u8,
    pub len: u8,
}

impl PioClaim {
    pub fn instruction_mask(&self) -> u32 {
        program_mask(self.len) << self.offset
    }
}

fn program_mask(len: u8) -> u32 {
    if len >= INSTRUCTION_MEMORY {
        u32::MAX
    } else {
        (1u32 << len) - 1
    }
}

/// Source of free PIO resources. Backends probe it rather than
/// assuming a particular block or state machine is available.
pub trait ResourceRegistry {
    /// Claim the first free state machine in a block that also has room
    /// for a `program_len` word program
    fn claim(&mut self, program_len: u8) -> Option<PioClaim>;

    fn release(&mut self, claim: &PioClaim);
}

impl<R: ResourceRegistry + ?Sized> ResourceRegistry for &mut R {
    fn claim(&mut self, program_len: u8) -> Option<PioClaim> {
        (**self).claim(program_len)
    }

    fn release(&mut self, claim: &PioClaim) {
        (**self).release(claim)
    }
}

/// Bookkeeping of state machines and instruction memory across PIO blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PioRegistry {
    sm_used: [u8; PIO_BLOCKS],
    instructions_used: [u32; PIO_BLOCKS],
}

impl PioRegistry {
    pub const fn new() -> Self {
        Self {
            sm_used: [0; PIO_BLOCKS],
            instructions_used: [0; PIO_BLOCKS],
        }
    }

    /// Mark a state machine as taken by code outside this driver
    pub fn reserve_state_machine(&mut self, block: u8, sm: u8) {
        if let Some(used) = self.sm_used.get_mut(usize::from(block)) {
            *used |= 1u8 << (sm % STATE_MACHINES);
        }
    }

    /// Mark instruction memory words as taken by code outside this driver
    pub fn reserve_instructions(&mut self, block: u8, mask: u32) {
        if let Some(used) = self.instructions_used.get_mut(usize::from(block)) {
            *used |= mask;
        }
    }

    pub fn is_state_machine_free(&self, block: u8, sm: u8) -> bool {
        self.sm_used
            .get(usize::from(block))
            .map_or(false, |&used| {
                sm < STATE_MACHINES && used & (1u8 << sm) == 0
            })
    }

    pub fn instructions_used(&self, block: u8) -> u32 {
        self.instructions_used
            .get(usize::from(block))
            .copied()
            .unwrap_or(u32::MAX)
    }

    /// Highest free offset that fits `len` words, like the Pico SDK allocator
    fn find_space(used: u32, len: u8) -> Option<u8> {
        if len == 0 || len > INSTRUCTION_MEMORY {
            return None;
        }
        let mask = program_mask(len);
        (0..=INSTRUCTION_MEMORY - len)
            .rev()
            .find(|&offset| used & (mask << offset) == 0)
    }
}

impl ResourceRegistry for PioRegistry {
    fn claim(&mut self, program_len: u8) -> Option<PioClaim> {
        for block in 0..PIO_BLOCKS {
            let sm_used = self.sm_used[block];
            let sm = (0..STATE_MACHINES).find(|&sm| sm_used & (1u8 << sm) == 0);
            let offset =
                Self::find_space(self.instructions_used[block], program_len);
            if let (Some(sm), Some(offset)) = (sm, offset) {
                let claim = PioClaim {
                    block: block as u8,
                    sm,
                    offset,
                    len: program_len,
                };
                self.sm_used[block] |= 1u8 << sm;
                self.instructions_used[block] |= claim.instruction_mask();
                return Some(claim);
            }
        }
        None
    }

    fn release(&mut self, claim: &PioClaim) {
        let block = usize::from(claim.block);
        if block < PIO_BLOCKS {
            self.sm_used[block] &= !(1u8 << (claim.sm % STATE_MACHINES));
            self.instructions_used[block] &= !claim.instruction_mask();
        }
    }
}

/// State machine configuration for the capture program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmConfig {
    pub wrap_bottom: u8,
    pub wrap_top: u8,
    /// First IN pin; `in_count` consecutive pins are inputs
    pub in_base: u8,
    pub in_count: u8,
    pub shift_right: bool,
    pub autopush: bool,
    pub push_threshold: u8,
    /// Join TX FIFO into RX for a deeper receive queue
    pub join_rx: bool,
}

impl SmConfig {
    pub fn capture(claim: &PioClaim, pins: &PinAssignment) -> Self {
        Self {
            wrap_bottom: claim.offset,
            wrap_top: claim.offset + claim.len - 1,
            in_base: pins.data_base(),
            in_count: DATA_PINS as u8,
            shift_right: false,
            autopush: true,
            push_threshold: DATA_PINS as u8,
            join_rx: true,
        }
    }
}

/// Programmable I/O hardware
pub trait PioBlock {
    fn load(&mut self, block: u8, offset: u8, program: &[u16]);
    fn unload(&mut self, block: u8, offset: u8, len: u8);
    fn configure(&mut self, claim: &PioClaim, config: &SmConfig);
    /// Skip input synchronizers for the masked pins: faster response,
    /// less noise immunity
    fn set_input_sync_bypass(&mut self, block: u8, mask: u32);
    fn set_enabled(&mut self, claim: &PioClaim, enabled: bool);
    /// Clear the RX FIFO and jump back to the first program instruction
    fn restart(&mut self, claim: &PioClaim);
    fn rx_empty(&mut self, claim: &PioClaim) -> bool;
    fn rx_read(&mut self, claim: &PioClaim) -> u32;
}

struct PioState {
    claim: PioClaim,
    masks: SyncMasks,
    xclk: u8,
    deadline: Deadline,
}

/// Capture backend running `CAPTURE_PROGRAM` on a claimed state machine
pub struct PioCapture<R, B, C, G> {
    registry: R,
    pio: B,
    clock: C,
    gpio: G,
    core_clock_hz: u32,
    state: Option<PioState>,
}

impl<R, B, C, G> PioCapture<R, B, C, G>
where
    R: ResourceRegistry,
    B: PioBlock,
    C: ClockGenerator,
    G: GpioBank,
{
    pub fn new(
        registry: R,
        pio: B,
        clock: C,
        gpio: G,
        core_clock_hz: u32,
    ) -> Self {
        Self {
            registry,
            pio,
            clock,
            gpio,
            core_clock_hz,
            state: None,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resources held by the active session
    pub fn claim(&self) -> Option<&PioClaim> {
        self.state.as_ref().map(|state| &state.claim)
    }

    /// Return the peripherals, ending any active session first
    pub fn release(mut self) -> (R, B, C, G) {
        self.end();
        (self.registry, self.pio, self.clock, self.gpio)
    }
}

fn next_byte<B: PioBlock>(
    pio: &mut B,
    claim: &PioClaim,
    deadline: Deadline,
) -> Result<u8, CaptureError> {
    deadline.wait(|| !pio.rx_empty(claim))?;
    Ok(pio.rx_read(claim) as u8)
}

impl<R, B, C, G> Arch for PioCapture<R, B, C, G>
where
    R: ResourceRegistry,
    B: PioBlock,
    C: ClockGenerator,
    G: GpioBank,
{
    fn begin(
        &mut self,
        pins: &PinAssignment,
        config: &Config,
    ) -> Result<(), ArchError> {
        if self.state.is_some() {
            return Err(ArchError::ResourceUnavailable);
        }
        pins.validate()?;
        let setting =
            ClockSetting::for_xclk(self.core_clock_hz, config.xclk_hz)?;
        let program = CAPTURE_PROGRAM.patch(pins);

        let claim = self
            .registry
            .claim(program.len() as u8)
            .ok_or(ArchError::ResourceUnavailable)?;

        if let Err(err) = self.clock.start(pins.xclk, &setting) {
            self.registry.release(&claim);
            return Err(err);
        }

        let masks = SyncMasks::new(pins);
        self.pio.load(claim.block, claim.offset, &program);
        self.pio.configure(&claim, &SmConfig::capture(&claim, pins));
        self.pio
            .set_input_sync_bypass(claim.block, masks.data | masks.pclk);
        self.pio.set_enabled(&claim, true);

        #[cfg(feature = "rttdebug")]
        rprintln!(
            "pio{} sm{} program at {}",
            claim.block,
            claim.sm,
            claim.offset
        );

        self.state = Some(PioState {
            claim,
            masks,
            xclk: pins.xclk,
            deadline: config.deadline,
        });
        Ok(())
    }

    /// One byte per PCLK, two bytes per pixel
    fn words_per_frame(&self, width: u16, height: u16) -> usize {
        usize::from(width) * usize::from(height)
    }

    fn capture(
        &mut self,
        dest: &mut [u16],
        width: u16,
        height: u16,
    ) -> Result<(), CaptureError> {
        let (claim, masks, deadline) = match &self.state {
            Some(state) => (state.claim, state.masks, state.deadline),
            None => return Err(CaptureError::NotStarted),
        };
        let needed = self.words_per_frame(width, height);
        let frame = frame_slice(dest, needed)?;
        if needed == 0 {
            return Ok(());
        }

        // let any frame in flight finish, then re-arm on the next VSYNC
        wait_level(&mut self.gpio, masks.vsync, false, deadline)?;
        self.pio.restart(&claim);

        for word in frame.iter_mut() {
            let hi = next_byte(&mut self.pio, &claim, deadline)?;
            let lo = next_byte(&mut self.pio, &claim, deadline)?;
            *word = u16::from_be_bytes([hi, lo]);
        }
        Ok(())
    }

    fn end(&mut self) {
        if let Some(state) = self.state.take() {
            let claim = state.claim;
            self.pio.set_enabled(&claim, false);
            self.pio.unload(claim.block, claim.offset, claim.len);
            self.registry.release(&claim);
            self.clock.stop(state.xclk);
        }
    }
}
