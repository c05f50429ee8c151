// Licensed under the Apache-2.0 license

use crate::enhance::CabcState;
use crate::error::{DpuError, DpuResult};
use log::debug;
use smlang::statemachine;

// Adaptive backlight control moves in one direction only
statemachine! {
    derive_states: [Debug, Clone, Copy, Eq],
    derive_events: [Clone, Debug],
    transitions: {
        *Disabled + Start / on_start = Working,

        Working + Stop / on_stop = Stopping,

        Stopping + Finish / on_finish = Disabled,
    }
}

pub trait StateMachineActions {
    // Actions
    fn on_start(&self, ctx: &mut InnerContext) -> Result<(), ()> {
        ctx.frame_no = 0;
        Ok(())
    }
    fn on_stop(&self, ctx: &mut InnerContext) -> Result<(), ()> {
        ctx.frame_no = 0;
        Ok(())
    }
    fn on_finish(&self, ctx: &mut InnerContext) -> Result<(), ()> {
        ctx.frame_no = 0;
        Ok(())
    }
}

// Implement the context struct
pub struct DefaultActions;
impl StateMachineActions for DefaultActions {}

pub struct InnerContext {
    /// 0 before the first trigger, 1 after it and 2 once steady.
    pub frame_no: u32,
}

pub struct Context<T: StateMachineActions> {
    inner: T,
    pub inner_ctx: InnerContext,
}

impl<T: StateMachineActions> Context<T> {
    pub fn new(context: T, frame_no: u32) -> Self {
        Self {
            inner: context,
            inner_ctx: InnerContext { frame_no },
        }
    }
}

macro_rules! delegate_to_inner {
    ($($fn_name:ident ($($arg:ident : $arg_ty:ty),*) -> $ret:ty),* $(,)?) => {
        $(
            fn $fn_name(&mut self, $($arg: $arg_ty),*) -> $ret {
                debug!("Cabc Action: {}", stringify!($fn_name));
                self.inner.$fn_name(&mut self.inner_ctx, $($arg),*)
            }
        )*
    };
}

impl<T: StateMachineActions> StateMachineContext for Context<T> {
    // Actions
    delegate_to_inner! {
        on_start() -> Result<(), ()>,
        on_stop() -> Result<(), ()>,
        on_finish() -> Result<(), ()>
    }
}

pub type CabcStateMachine = StateMachine<Context<DefaultActions>>;

impl From<CabcState> for States {
    fn from(state: CabcState) -> Self {
        match state {
            CabcState::Working => States::Working,
            CabcState::Stopping => States::Stopping,
            CabcState::Disabled => States::Disabled,
        }
    }
}

impl From<States> for CabcState {
    fn from(state: States) -> Self {
        match state {
            States::Working => CabcState::Working,
            States::Stopping => CabcState::Stopping,
            States::Disabled => CabcState::Disabled,
        }
    }
}

pub fn new_state_machine(initial: CabcState, frame_no: u32) -> CabcStateMachine {
    StateMachine::new_with_state(Context::new(DefaultActions, frame_no), initial.into())
}

pub fn cabc_state(sm: &CabcStateMachine) -> CabcState {
    (*sm.state()).into()
}

/// Moves the machine to `target` if that is the next state along the cycle.
/// Asking for the current state is accepted and changes nothing.
pub fn request_state(sm: &mut CabcStateMachine, target: CabcState) -> DpuResult<()> {
    let current = cabc_state(sm);
    if current == target {
        return Ok(());
    }
    let event = match (current, target) {
        (CabcState::Disabled, CabcState::Working) => Events::Start,
        (CabcState::Working, CabcState::Stopping) => Events::Stop,
        (CabcState::Stopping, CabcState::Disabled) => Events::Finish,
        _ => {
            return Err(DpuError::InvalidCabcTransition {
                from: current.to_string(),
                to: target.to_string(),
            })
        }
    };
    sm.process_event(event)
        .map(|_| ())
        .map_err(|_| DpuError::InvalidCabcTransition {
            from: current.to_string(),
            to: target.to_string(),
        })
}
