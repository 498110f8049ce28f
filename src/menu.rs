//! Máquina de estados del menú de diagnóstico.
//!
//! `DisplayingMenu -> AwaitingSelection -> ExecutingAction -> DisplayingMenu`,
//! con `Done` como único estado terminal. Una entrada inválida reporta el
//! error y vuelve a mostrar el menú; el fin de la entrada equivale a salir.
use std::io::{self, BufRead, Write};

use nbx_adapters::{ActionExecutor, DiagnosticAction};
use thiserror::Error;

use crate::console::Console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    DisplayingMenu,
    AwaitingSelection,
    ExecutingAction(DiagnosticAction),
    Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("please enter a number")]
    NotANumber,
    #[error("no option {0}: choose 1-{max}", max = DiagnosticAction::ALL.len())]
    OutOfRange(usize),
}

pub fn parse_selection(input: &str) -> Result<DiagnosticAction, SelectionError> {
    let n: usize = input.trim().parse().map_err(|_| SelectionError::NotANumber)?;
    DiagnosticAction::from_number(n).ok_or(SelectionError::OutOfRange(n))
}

pub struct Menu<E: ActionExecutor> {
    executor: E,
    state: MenuState,
}

impl<E: ActionExecutor> Menu<E> {
    pub fn new(executor: E) -> Self {
        Self { executor,
               state: MenuState::DisplayingMenu }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Avanza un estado. `input` sólo se lee en `AwaitingSelection`.
    pub fn step<R: BufRead, W: Write>(&mut self, input: &mut R, console: &mut Console<W>) -> io::Result<MenuState> {
        self.state = match self.state {
            MenuState::DisplayingMenu => {
                console.plain("")?;
                console.plain("NetBox diagnostics")?;
                for action in DiagnosticAction::ALL {
                    console.plain(&format!("  {action}"))?;
                }
                MenuState::AwaitingSelection
            }
            MenuState::AwaitingSelection => {
                write!(console.writer(), "Select an option: ")?;
                console.writer().flush()?;
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    console.plain("")?;
                    MenuState::Done
                } else {
                    match parse_selection(&line) {
                        Ok(action) => MenuState::ExecutingAction(action),
                        Err(e) => {
                            console.error(&e.to_string())?;
                            MenuState::DisplayingMenu
                        }
                    }
                }
            }
            MenuState::ExecutingAction(DiagnosticAction::Exit) => MenuState::Done,
            MenuState::ExecutingAction(action) => {
                console.info(&format!("Running: {}", action.label()))?;
                for report in self.executor.execute(action) {
                    for line in &report.lines {
                        console.plain(&format!("  {line}"))?;
                    }
                    match &report.error {
                        None => console.success(report.action.label())?,
                        Some(e) => console.error(&format!("{}: {e}", report.action.label()))?,
                    }
                }
                MenuState::DisplayingMenu
            }
            MenuState::Done => MenuState::Done,
        };
        Ok(self.state)
    }

    /// Corre hasta `Done`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, console: &mut Console<W>) -> io::Result<()> {
        while self.step(input, console)? != MenuState::Done {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;

    use nbx_adapters::DiagnosticReport;
    use nbx_core::StepError;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<DiagnosticAction>>,
    }

    impl ActionExecutor for &Recorder {
        fn execute(&self, action: DiagnosticAction) -> Vec<DiagnosticReport> {
            self.calls.borrow_mut().push(action);
            let error = (action == DiagnosticAction::CheckRedis).then(|| StepError::Verification("no PONG".into()));
            vec![DiagnosticReport { action,
                                    lines: vec!["checked".into()],
                                    error }]
        }
    }

    fn drive(input: &str, recorder: &Recorder) -> String {
        let mut menu = Menu::new(recorder);
        let mut console = Console::new(Vec::new());
        menu.run(&mut Cursor::new(input.to_string()), &mut console).unwrap();
        assert_eq!(menu.state(), MenuState::Done);
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn parses_selections() {
        assert_eq!(parse_selection(" 7\n"), Ok(DiagnosticAction::CheckRedis));
        assert_eq!(parse_selection("0"), Err(SelectionError::OutOfRange(0)));
        assert_eq!(parse_selection("13"), Err(SelectionError::OutOfRange(13)));
        assert_eq!(parse_selection("x"), Err(SelectionError::NotANumber));
    }

    #[test]
    fn invalid_input_keeps_the_loop_alive() {
        let rec = Recorder::default();
        let out = drive("99\nabc\n1\n12\n", &rec);
        assert_eq!(*rec.calls.borrow(), vec![DiagnosticAction::ServiceStatus]);
        assert!(out.contains("no option 99: choose 1-12"));
        assert!(out.contains("please enter a number"));
        // inicial, tras cada entrada inválida y tras la acción
        assert_eq!(out.matches("NetBox diagnostics").count(), 4);
    }

    #[test]
    fn exit_is_not_dispatched() {
        let rec = Recorder::default();
        drive("12\n1\n", &rec);
        assert!(rec.calls.borrow().is_empty());
    }

    #[test]
    fn end_of_input_exits() {
        let rec = Recorder::default();
        let out = drive("7\n", &rec);
        assert_eq!(*rec.calls.borrow(), vec![DiagnosticAction::CheckRedis]);
        assert!(out.contains("Check Redis: ") && out.contains("no PONG"));
    }

    #[test]
    fn menu_is_shown_again_after_each_action() {
        let rec = Recorder::default();
        let out = drive("1\n5\n", &rec);
        assert_eq!(out.matches("NetBox diagnostics").count(), 3);
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        let rec = Recorder::default();
        let mut menu = Menu::new(&rec);
        let mut console = Console::new(Vec::new());
        let mut input = Cursor::new("99\n3\n".to_string());
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::AwaitingSelection);
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::DisplayingMenu);
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::AwaitingSelection);
        assert_eq!(menu.step(&mut input, &mut console).unwrap(),
                   MenuState::ExecutingAction(DiagnosticAction::FixPermissions));
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::DisplayingMenu);
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::AwaitingSelection);
        assert_eq!(menu.step(&mut input, &mut console).unwrap(), MenuState::Done);
    }
}
