//! UI state and key handling on top of the core session

use crate::clipboard;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eyre::{Context, Result};
use sneko_core::{
    Config, DirectoryTree, Network, RpcNetwork, Session, Severity, Toolchain,
};
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Compile,
    Playground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Editor,
    Panel,
}

/// Selectable rows of the playground tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Account,
    Constructor,
    Deploy,
    Args(usize),
    Value(usize),
    Invoke(usize),
}

impl Field {
    fn is_text_input(&self) -> bool {
        matches!(self, Field::Constructor | Field::Args(_) | Field::Value(_))
    }
}

pub struct App {
    pub config: Config,
    pub session: Session,
    pub tree: DirectoryTree,
    pub toolchain: Toolchain,
    runtime: Runtime,
    network: Option<Box<dyn Network>>,
    pub show_tree: bool,
    pub editor_collapsed: bool,
    pub tab: Tab,
    pub focus: Focus,
    /// Index into [`App::fields`]
    pub field: usize,
    /// First visible row of the compiler output pane
    pub compile_scroll: u16,
    pub should_quit: bool,
}

impl App {
    /// Builds the UI state for `root` without connecting to a network
    pub fn new(config: Config, root: PathBuf) -> Result<Self> {
        let tree = DirectoryTree::new(&root)
            .wrap_err_with(|| format!("Cannot browse {}", root.display()))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("Failed to start async runtime")?;
        let toolchain = Toolchain::from_config(&config);

        Ok(Self {
            config,
            session: Session::new(),
            tree,
            toolchain,
            runtime,
            network: None,
            show_tree: true,
            editor_collapsed: false,
            tab: Tab::Compile,
            focus: Focus::Tree,
            field: 0,
            compile_scroll: 0,
            should_quit: false,
        })
    }

    /// Starts or reaches the configured test network and loads its accounts
    pub fn connect_network(&mut self) {
        match RpcNetwork::connect(&self.config.network) {
            Ok(network) => {
                self.network = Some(Box::new(network));
                self.refresh_accounts();
            }
            Err(e) => self
                .session
                .notify(Severity::Warning, format!("Playground unavailable: {e}")),
        }
    }

    pub fn network_name(&self) -> Option<&str> {
        self.network.as_deref().map(|n| n.name())
    }

    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Account, Field::Constructor, Field::Deploy];
        for control in self.session.controls() {
            if control.args_placeholder.is_some() {
                fields.push(Field::Args(control.id));
            }
            if control.has_value_field {
                fields.push(Field::Value(control.id));
            }
            fields.push(Field::Invoke(control.id));
        }
        fields
    }

    /// Field under the cursor while the playground has focus
    pub fn current_field(&self) -> Option<Field> {
        if self.tab != Tab::Playground || self.focus != Focus::Panel {
            return None;
        }
        let fields = self.fields();
        fields.get(self.field.min(fields.len() - 1)).copied()
    }

    fn is_typing(&self) -> bool {
        (self.focus == Focus::Editor && !self.editor_collapsed)
            || self.current_field().is_some_and(|f| f.is_text_input())
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('p') => self.copy_code(),
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab => return self.cycle_focus(),
            KeyCode::Esc => {
                self.focus = if self.tree_visible() {
                    Focus::Tree
                } else {
                    Focus::Panel
                };
                return;
            }
            _ => {}
        }

        if self.is_typing() {
            match self.focus {
                Focus::Editor => self.on_editor_key(key.code),
                _ => self.on_input_key(key.code),
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('f') => {
                self.show_tree = !self.show_tree;
                if !self.show_tree && self.focus == Focus::Tree {
                    self.focus = Focus::Panel;
                }
            }
            KeyCode::Char('e') => {
                self.editor_collapsed = !self.editor_collapsed;
                if self.editor_collapsed {
                    self.focus = Focus::Panel;
                }
            }
            KeyCode::Char('1') => self.tab = Tab::Compile,
            KeyCode::Char('2') => self.tab = Tab::Playground,
            KeyCode::Char('c') => self.compile(),
            KeyCode::Char('d') => self.deploy(),
            KeyCode::Char('s') => self.generate_script(),
            KeyCode::Char('a') => self.generate_ape_project(),
            KeyCode::Char('y') => {
                let abi = self.session.abi_view().to_string();
                self.copy("ABI", &abi);
            }
            KeyCode::Char('b') => {
                let bytecode = self.session.bytecode_view().to_string();
                self.copy("bytecode", &bytecode);
            }
            KeyCode::Char('r') => self.refresh_accounts(),
            KeyCode::PageDown if self.tab == Tab::Compile => {
                self.compile_scroll = self.compile_scroll.saturating_add(5)
            }
            KeyCode::PageUp if self.tab == Tab::Compile => {
                self.compile_scroll = self.compile_scroll.saturating_sub(5)
            }
            code => match self.focus {
                Focus::Tree => self.on_tree_key(code),
                Focus::Panel => self.on_panel_key(code),
                Focus::Editor => {}
            },
        }
    }

    fn tree_visible(&self) -> bool {
        self.show_tree && !self.editor_collapsed
    }

    fn cycle_focus(&mut self) {
        let order: Vec<Focus> = [Focus::Tree, Focus::Editor, Focus::Panel]
            .into_iter()
            .filter(|f| match f {
                Focus::Tree => self.tree_visible(),
                Focus::Editor => !self.editor_collapsed,
                Focus::Panel => true,
            })
            .collect();
        let next = order
            .iter()
            .position(|f| *f == self.focus)
            .map_or(0, |i| (i + 1) % order.len());
        self.focus = order[next];
    }

    fn on_tree_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.tree.move_up(),
            KeyCode::Down => self.tree.move_down(),
            KeyCode::Enter | KeyCode::Right => {
                if let Some(path) = self.tree.activate() {
                    self.select_file(path);
                }
            }
            KeyCode::Left => {
                if let Some(entry) = self.tree.selected().cloned() {
                    if entry.is_dir && self.tree.is_expanded(&entry.path) {
                        self.tree.toggle(&entry.path);
                    }
                }
            }
            _ => {}
        }
    }

    fn on_editor_key(&mut self, code: KeyCode) {
        let Some(file) = self.session.active_file_mut() else {
            return;
        };
        let buffer = &mut file.buffer;
        match code {
            KeyCode::Char(c) => {
                buffer.insert_char(c);
            }
            KeyCode::Enter => {
                buffer.newline();
            }
            KeyCode::Backspace => {
                buffer.backspace();
            }
            KeyCode::Left => buffer.move_left(),
            KeyCode::Right => buffer.move_right(),
            KeyCode::Up => buffer.move_up(),
            KeyCode::Down => buffer.move_down(),
            KeyCode::Home => buffer.home(),
            KeyCode::End => buffer.end(),
            _ => {}
        }
    }

    fn on_panel_key(&mut self, code: KeyCode) {
        if self.tab == Tab::Compile {
            if code == KeyCode::Enter {
                self.compile();
            }
            return;
        }

        match (code, self.current_field()) {
            (KeyCode::Up, _) => self.field = self.field.saturating_sub(1),
            (KeyCode::Down, _) => self.field = (self.field + 1).min(self.fields().len() - 1),
            (KeyCode::Left, Some(Field::Account)) => {
                let index = self.session.active_account_index();
                self.session.select_account(index.saturating_sub(1));
            }
            (KeyCode::Right, Some(Field::Account)) => {
                let index = self.session.active_account_index();
                self.session.select_account(index + 1);
            }
            (KeyCode::Enter, Some(Field::Account)) => {
                let address = self
                    .session
                    .active_account()
                    .map(|account| format!("{:?}", account.address))
                    .unwrap_or_default();
                self.copy("account address", &address);
            }
            (KeyCode::Enter, Some(Field::Deploy)) => self.deploy(),
            (KeyCode::Enter, Some(Field::Invoke(id))) => self.invoke(id),
            _ => {}
        }
    }

    fn on_input_key(&mut self, code: KeyCode) {
        let Some(field) = self.current_field() else {
            return;
        };
        match code {
            KeyCode::Up => self.field = self.field.saturating_sub(1),
            KeyCode::Down => self.field = (self.field + 1).min(self.fields().len() - 1),
            KeyCode::Enter => match field {
                Field::Constructor => self.deploy(),
                Field::Args(id) | Field::Value(id) => self.invoke(id),
                _ => {}
            },
            KeyCode::Char(c) => {
                if let Some(input) = self.input_mut(field) {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.input_mut(field) {
                    input.pop();
                }
            }
            _ => {}
        }
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Constructor => Some(&mut self.session.constructor_args),
            Field::Args(id) => self.session.control_mut(id).map(|c| &mut c.args_input),
            Field::Value(id) => self.session.control_mut(id).map(|c| &mut c.value_input),
            _ => None,
        }
    }

    fn select_file(&mut self, path: PathBuf) {
        self.session.select_file(&path, &self.toolchain);
        self.field = 0;
        self.compile_scroll = 0;
    }

    fn compile(&mut self) {
        if !self.session.can_compile() {
            self.session
                .notify(Severity::Warning, "Select a .sol or .vy file to compile");
            return;
        }
        self.session.compile(&self.toolchain);
        self.field = 0;
        self.compile_scroll = 0;
        if self.session.diagnostics().is_some() {
            self.tab = Tab::Compile;
        }
    }

    fn deploy(&mut self) {
        if !self.session.can_deploy() {
            self.session
                .notify(Severity::Warning, "Compile a contract before deploying");
            return;
        }
        let Some(network) = &self.network else {
            self.session
                .notify(Severity::Error, "No test network available");
            return;
        };
        self.runtime.block_on(self.session.deploy(network.as_ref()));
        self.tab = Tab::Playground;
    }

    fn invoke(&mut self, id: usize) {
        let Some(network) = &self.network else {
            self.session
                .notify(Severity::Error, "No test network available");
            return;
        };
        self.runtime
            .block_on(self.session.invoke(network.as_ref(), id));
    }

    fn refresh_accounts(&mut self) {
        if let Some(network) = &self.network {
            self.runtime
                .block_on(self.session.refresh_accounts(network.as_ref()));
        }
    }

    fn generate_script(&mut self) {
        let dest = self.config.script_path.clone();
        self.session.generate_script(&dest);
    }

    fn generate_ape_project(&mut self) {
        match std::env::current_dir() {
            Ok(cwd) => {
                let name = self.config.project_name.clone();
                self.session.scaffold(&cwd, &name);
            }
            Err(e) => self.session.notify(Severity::Error, e.to_string()),
        }
    }

    fn copy_code(&mut self) {
        let code = self
            .session
            .active_file()
            .map(|f| f.buffer.text())
            .unwrap_or_default();
        self.copy("code", &code);
    }

    fn copy(&mut self, what: &str, text: &str) {
        if text.is_empty() {
            self.session
                .notify(Severity::Warning, format!("Nothing to copy: no {what} yet"));
            return;
        }
        match clipboard::copy(text) {
            Ok(()) => self
                .session
                .notify(Severity::Info, format!("Copied {what} to clipboard")),
            Err(e) => self
                .session
                .notify(Severity::Error, format!("Failed to copy {what}: {e}")),
        }
    }
}
