//! # Game State Management
//!
//! Screens are [`GameState`]s kept on a stack by the [`StateMachine`]. Only
//! the top state receives input and updates; rendering starts at the
//! topmost non-overlay state so a pause menu draws over the game beneath it.
//!
//! States never change the stack themselves. They return a [`Transition`]
//! and the machine applies it after the call returns.

pub mod combat;
pub mod context;
pub mod customization;
pub mod game_over;
pub mod high_scores;
pub mod menu;
pub mod pause;
pub mod playing;

pub use combat::CombatState;
pub use context::GameContext;
pub use customization::CustomizationState;
pub use game_over::GameOverState;
pub use high_scores::HighScoresState;
pub use menu::MenuState;
pub use pause::PauseState;
pub use playing::PlayingState;

use crate::input::InputFrame;
use crate::rendering::Renderer;
use crate::GameResult;
use log::{debug, error, info};
use std::fmt;

/// Which screen a state is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Menu,
    Customization,
    Playing,
    Combat,
    Pause,
    GameOver,
    HighScores,
}

/// A stack change requested by a state.
pub enum Transition {
    None,
    /// Pause the current state and put a new one on top
    Push(Box<dyn GameState>),
    /// Leave the current state and resume the one beneath
    Pop,
    /// Leave every state on the stack and start fresh with a new one
    Switch(Box<dyn GameState>),
    Quit,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::None => write!(f, "None"),
            Transition::Push(state) => write!(f, "Push({:?})", state.kind()),
            Transition::Pop => write!(f, "Pop"),
            Transition::Switch(state) => write!(f, "Switch({:?})", state.kind()),
            Transition::Quit => write!(f, "Quit"),
        }
    }
}

/// One screen of the game.
///
/// Lifecycle hooks run in this order: `on_enter` when pushed, `on_pause`
/// when another state is pushed on top, `on_resume` when it becomes the top
/// again, and `on_exit` when removed.
pub trait GameState {
    fn kind(&self) -> StateKind;

    /// A failure keeps the state off the stack.
    fn on_enter(&mut self, _ctx: &mut GameContext) -> GameResult<()> {
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut GameContext) {}

    fn on_pause(&mut self, _ctx: &mut GameContext) {}

    fn on_resume(&mut self, _ctx: &mut GameContext) {}

    fn handle_input(&mut self, input: &InputFrame, ctx: &mut GameContext) -> Transition;

    fn update(&mut self, dt: f32, ctx: &mut GameContext) -> Transition;

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer);

    /// Overlays are drawn on top of the state beneath them.
    fn is_overlay(&self) -> bool {
        false
    }

    /// Whether letters should arrive as typed text rather than commands.
    fn wants_text_input(&self) -> bool {
        false
    }
}

/// The stack of active states.
#[derive(Default)]
pub struct StateMachine {
    stack: Vec<Box<dyn GameState>>,
    quit: bool,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `state`, pausing the current top. If the new state fails to
    /// enter, it is dropped and the old top resumes.
    pub fn push(&mut self, mut state: Box<dyn GameState>, ctx: &mut GameContext) {
        if let Some(top) = self.stack.last_mut() {
            top.on_pause(ctx);
        }
        match state.on_enter(ctx) {
            Ok(()) => {
                debug!("pushed state {:?}", state.kind());
                self.stack.push(state);
            }
            Err(e) => {
                error!("Could not enter {:?}: {}", state.kind(), e);
                if let Some(top) = self.stack.last_mut() {
                    top.on_resume(ctx);
                }
            }
        }
    }

    /// Removes the top state and resumes the one beneath.
    pub fn pop(&mut self, ctx: &mut GameContext) {
        if let Some(mut state) = self.stack.pop() {
            state.on_exit(ctx);
            debug!("popped state {:?}", state.kind());
        }
        if let Some(top) = self.stack.last_mut() {
            top.on_resume(ctx);
        }
    }

    /// Exits every state, top first, then enters `state`.
    pub fn switch(&mut self, state: Box<dyn GameState>, ctx: &mut GameContext) {
        while let Some(mut old) = self.stack.pop() {
            old.on_exit(ctx);
        }
        info!("switching to {:?}", state.kind());
        self.push(state, ctx);
    }

    pub fn apply(&mut self, transition: Transition, ctx: &mut GameContext) {
        match transition {
            Transition::None => {}
            Transition::Push(state) => self.push(state, ctx),
            Transition::Pop => self.pop(ctx),
            Transition::Switch(state) => self.switch(state, ctx),
            Transition::Quit => {
                info!("quit requested");
                while let Some(mut old) = self.stack.pop() {
                    old.on_exit(ctx);
                }
                self.quit = true;
            }
        }
    }

    pub fn handle_input(&mut self, input: &InputFrame, ctx: &mut GameContext) {
        let transition = match self.stack.last_mut() {
            Some(top) => top.handle_input(input, ctx),
            None => return,
        };
        self.apply(transition, ctx);
    }

    pub fn update(&mut self, dt: f32, ctx: &mut GameContext) {
        ctx.apply_settings_changes();
        let transition = match self.stack.last_mut() {
            Some(top) => top.update(dt, ctx),
            None => return,
        };
        self.apply(transition, ctx);
    }

    /// Renders from the topmost non-overlay state upward.
    pub fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        let base = self
            .stack
            .iter()
            .rposition(|state| !state.is_overlay())
            .unwrap_or(0);
        for state in &self.stack[base..] {
            state.render(ctx, renderer);
        }
    }

    pub fn current_kind(&self) -> Option<StateKind> {
        self.stack.last().map(|state| state.kind())
    }

    /// Kinds on the stack, bottom first.
    pub fn kinds(&self) -> Vec<StateKind> {
        self.stack.iter().map(|state| state.kind()).collect()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_running(&self) -> bool {
        !self.quit && !self.stack.is_empty()
    }

    pub fn wants_text_input(&self) -> bool {
        self.stack
            .last()
            .map(|state| state.wants_text_input())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, TemplateLibrary};
    use crate::GameError;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        journal: Journal,
        overlay: bool,
        fail_enter: bool,
    }

    impl Probe {
        fn boxed(label: &'static str, journal: &Journal) -> Box<dyn GameState> {
            Box::new(Self {
                label,
                journal: Rc::clone(journal),
                overlay: false,
                fail_enter: false,
            })
        }

        fn note(&self, event: &str) {
            self.journal
                .borrow_mut()
                .push(format!("{}:{}", self.label, event));
        }
    }

    impl GameState for Probe {
        fn kind(&self) -> StateKind {
            StateKind::Menu
        }

        fn on_enter(&mut self, _ctx: &mut GameContext) -> GameResult<()> {
            self.note("enter");
            if self.fail_enter {
                return Err(GameError::Init("refused".to_string()));
            }
            Ok(())
        }

        fn on_exit(&mut self, _ctx: &mut GameContext) {
            self.note("exit");
        }

        fn on_pause(&mut self, _ctx: &mut GameContext) {
            self.note("pause");
        }

        fn on_resume(&mut self, _ctx: &mut GameContext) {
            self.note("resume");
        }

        fn handle_input(&mut self, _input: &InputFrame, _ctx: &mut GameContext) -> Transition {
            Transition::Pop
        }

        fn update(&mut self, _dt: f32, _ctx: &mut GameContext) -> Transition {
            Transition::None
        }

        fn render(&self, _ctx: &GameContext, renderer: &mut dyn Renderer) {
            renderer.draw_text(self.label, 0.0, 0.0, 10.0, crate::utils::Rgba::WHITE);
        }

        fn is_overlay(&self) -> bool {
            self.overlay
        }
    }

    fn context() -> GameContext {
        GameContext::new(Settings::new(), TemplateLibrary::builtin(), 1)
    }

    #[test]
    fn test_lifecycle_order() {
        let journal = Journal::default();
        let mut ctx = context();
        let mut machine = StateMachine::new();

        machine.push(Probe::boxed("a", &journal), &mut ctx);
        machine.push(Probe::boxed("b", &journal), &mut ctx);
        machine.pop(&mut ctx);

        assert_eq!(
            *journal.borrow(),
            vec!["a:enter", "a:pause", "b:enter", "b:exit", "a:resume"]
        );
        assert_eq!(machine.depth(), 1);
    }

    #[test]
    fn test_switch_replaces_whole_stack() {
        let journal = Journal::default();
        let mut ctx = context();
        let mut machine = StateMachine::new();
        machine.push(Probe::boxed("a", &journal), &mut ctx);
        machine.push(Probe::boxed("b", &journal), &mut ctx);
        journal.borrow_mut().clear();

        machine.apply(Transition::Switch(Probe::boxed("c", &journal)), &mut ctx);

        assert_eq!(*journal.borrow(), vec!["b:exit", "a:exit", "c:enter"]);
        assert_eq!(machine.depth(), 1);
    }

    #[test]
    fn test_failed_enter_is_not_pushed() {
        let journal = Journal::default();
        let mut ctx = context();
        let mut machine = StateMachine::new();
        machine.push(Probe::boxed("a", &journal), &mut ctx);

        let refusing = Box::new(Probe {
            label: "b",
            journal: Rc::clone(&journal),
            overlay: false,
            fail_enter: true,
        });
        machine.push(refusing, &mut ctx);

        assert_eq!(machine.depth(), 1);
        assert_eq!(journal.borrow().last().map(String::as_str), Some("a:resume"));
    }

    #[test]
    fn test_render_includes_state_under_overlay() {
        let journal = Journal::default();
        let mut ctx = context();
        let mut machine = StateMachine::new();
        machine.push(Probe::boxed("bottom", &journal), &mut ctx);
        machine.push(Probe::boxed("game", &journal), &mut ctx);
        let overlay = Box::new(Probe {
            label: "overlay",
            journal: Rc::clone(&journal),
            overlay: true,
            fail_enter: false,
        });
        machine.push(overlay, &mut ctx);

        let mut renderer = crate::rendering::RecordingRenderer::default();
        machine.render(&ctx, &mut renderer);
        assert_eq!(renderer.texts(), vec!["game", "overlay"]);
    }

    #[test]
    fn test_quit_and_empty_stack_stop_machine() {
        let journal = Journal::default();
        let mut ctx = context();
        let mut machine = StateMachine::new();
        assert!(!machine.is_running());

        machine.push(Probe::boxed("a", &journal), &mut ctx);
        assert!(machine.is_running());
        machine.handle_input(&InputFrame::new(), &mut ctx);
        assert!(!machine.is_running());

        machine.push(Probe::boxed("b", &journal), &mut ctx);
        machine.apply(Transition::Quit, &mut ctx);
        assert!(!machine.is_running());
        assert_eq!(machine.depth(), 0);
    }
}
