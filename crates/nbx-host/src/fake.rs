//! `FakeHost`: host Ubuntu simulado en memoria para tests.
//!
//! Interpreta los comandos que emiten los steps (apt, useradd, psql,
//! systemctl, manage.py, utilidades de archivos, ...) sobre un estado
//! mutable: usuarios, paquetes, servicios, roles y bases de PostgreSQL,
//! archivos con dueño/modo y symlinks. Permite inyectar fallos por
//! coincidencia de texto sobre el comando renderizado.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::command::Privilege;
use crate::{CommandOutput, CommandSpec, Host, HostError};

pub const UBUNTU_2404: &str = "PRETTY_NAME=\"Ubuntu 24.04.1 LTS\"\nNAME=\"Ubuntu\"\nVERSION_ID=\"24.04\"\nID=ubuntu\nID_LIKE=debian\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeService {
    pub enabled: bool,
    pub active: bool,
    /// `systemctl start` deja el servicio inactivo.
    pub fail_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFile {
    pub contents: String,
    pub mode: u32,
    pub owner: String,
    pub group: String,
}

#[derive(Debug)]
struct Injected {
    pattern: String,
    remaining: u32,
}

#[derive(Debug, Default)]
struct State {
    uid: u32,
    sudo_ok: bool,
    users: BTreeSet<String>,
    packages: BTreeSet<String>,
    services: BTreeMap<String, FakeService>,
    pg_roles: BTreeMap<String, String>,
    pg_databases: BTreeMap<String, String>,
    migrations_pending: bool,
    static_collected: bool,
    files: BTreeMap<PathBuf, FakeFile>,
    dirs: BTreeMap<PathBuf, String>,
    links: BTreeMap<PathBuf, PathBuf>,
    commands: Vec<String>,
    failures: Vec<Injected>,
}

#[derive(Debug)]
pub struct FakeHost {
    state: RefCell<State>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Ubuntu 24.04 recién instalado, invocado por un usuario no root con
    /// sudo sin contraseña.
    pub fn new() -> Self {
        let mut state = State { uid: 1000,
                                sudo_ok: true,
                                migrations_pending: true,
                                ..State::default() };
        state.users.insert("root".into());
        state.files.insert(PathBuf::from("/etc/os-release"), FakeFile::system(UBUNTU_2404));
        Self { state: RefCell::new(state) }
    }

    pub fn with_uid(self, uid: u32) -> Self {
        self.state.borrow_mut().uid = uid;
        self
    }

    pub fn without_sudo(self) -> Self {
        self.state.borrow_mut().sudo_ok = false;
        self
    }

    pub fn with_os_release(self, contents: &str) -> Self {
        self.put_file("/etc/os-release", contents, 0o644, "root");
        self
    }

    /// Todo comando cuyo texto contenga `pattern` falla (exit 1).
    pub fn fail_on(&self, pattern: &str) {
        self.fail_times(pattern, u32::MAX);
    }

    /// Las próximas `times` coincidencias con `pattern` fallan.
    pub fn fail_times(&self, pattern: &str, times: u32) {
        self.state.borrow_mut().failures.push(Injected { pattern: pattern.to_string(),
                                                         remaining: times });
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    pub fn set_service(&self, name: &str, service: FakeService) {
        self.state.borrow_mut().services.insert(name.to_string(), service);
    }

    pub fn stop_service(&self, name: &str) {
        if let Some(s) = self.state.borrow_mut().services.get_mut(name) {
            s.active = false;
        }
    }

    pub fn service(&self, name: &str) -> Option<FakeService> {
        self.state.borrow().services.get(name).cloned()
    }

    pub fn put_file(&self, path: &str, contents: &str, mode: u32, owner: &str) {
        self.state.borrow_mut().files.insert(PathBuf::from(path),
                                             FakeFile { contents: contents.to_string(),
                                                        mode,
                                                        owner: owner.to_string(),
                                                        group: owner.to_string() });
    }

    pub fn remove_path(&self, path: &str) {
        let mut st = self.state.borrow_mut();
        let r = st.resolve(Path::new(path));
        st.files.retain(|k, _| !k.starts_with(&r));
        st.dirs.retain(|k, _| !k.starts_with(&r));
    }

    /// Archivo visto a través de symlinks.
    pub fn file(&self, path: &str) -> Option<FakeFile> {
        let st = self.state.borrow();
        st.files.get(&st.resolve(Path::new(path))).cloned()
    }

    pub fn link(&self, path: &str) -> Option<PathBuf> {
        self.state.borrow().links.get(Path::new(path)).cloned()
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.borrow().users.contains(name)
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.state.borrow().packages.contains(name)
    }

    pub fn pg_password(&self, role: &str) -> Option<String> {
        self.state.borrow().pg_roles.get(role).cloned()
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.borrow().pg_databases.contains_key(name)
    }

    pub fn set_migrations_pending(&self, pending: bool) {
        self.state.borrow_mut().migrations_pending = pending;
    }

    pub fn static_collected(&self) -> bool {
        self.state.borrow().static_collected
    }

    /// Comandos ejecutados, renderizados como en los logs.
    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.state.borrow().commands.iter().any(|c| c.contains(pattern))
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }
}

impl Host for FakeHost {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, HostError> {
        let mut st = self.state.borrow_mut();
        let rendered = cmd.to_string();
        st.commands.push(rendered.clone());

        if let Some(hit) = st.failures.iter_mut().find(|f| f.remaining > 0 && rendered.contains(&f.pattern)) {
            if hit.remaining != u32::MAX {
                hit.remaining -= 1;
            }
            return Ok(CommandOutput::failed(1, format!("injected failure: {}", hit.pattern)));
        }
        match &cmd.privilege {
            Privilege::Invoker => {}
            _ if !st.sudo_ok => return Ok(CommandOutput::failed(1, "sudo: a password is required")),
            Privilege::User(u) if !st.users.contains(u) => {
                return Ok(CommandOutput::failed(1, format!("sudo: unknown user {u}")))
            }
            _ => {}
        }
        if cmd.program.starts_with('/') && !st.is_file(Path::new(&cmd.program)) {
            return Ok(CommandOutput::failed(1, format!("sudo: {}: command not found", cmd.program)));
        }
        Ok(st.dispatch(cmd))
    }

    fn effective_uid(&self) -> u32 {
        self.state.borrow().uid
    }
}

impl FakeFile {
    fn system(contents: &str) -> Self {
        Self { contents: contents.to_string(),
               mode: 0o644,
               owner: "root".into(),
               group: "root".into() }
    }
}

impl State {
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for comp in path.components() {
            out.push(comp);
            let mut hops = 0;
            while let Some(target) = self.links.get(&out) {
                out = match out.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target.clone(),
                };
                hops += 1;
                if hops > 8 {
                    break;
                }
            }
        }
        out
    }

    /// Resuelve el directorio padre pero no el último componente (para
    /// operar sobre el symlink mismo).
    fn resolve_parent(&self, path: &Path) -> PathBuf {
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => self.resolve(parent).join(name),
            _ => path.to_path_buf(),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&self.resolve(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let r = self.resolve(path);
        self.files.keys().any(|k| k.starts_with(&r)) || self.dirs.keys().any(|k| k.starts_with(&r))
    }

    fn owner_of(&self, path: &Path) -> Option<(String, u32)> {
        let r = self.resolve(path);
        if let Some(f) = self.files.get(&r) {
            return Some((f.owner.clone(), f.mode));
        }
        if let Some(owner) = self.dirs.get(&r) {
            return Some((owner.clone(), 0o755));
        }
        self.exists(&r).then(|| ("root".to_string(), 0o755))
    }

    fn active(&self, service: &str) -> bool {
        self.services.get(service).is_some_and(|s| s.active)
    }

    fn dispatch(&mut self, cmd: &CommandSpec) -> CommandOutput {
        let args: Vec<&str> = cmd.args.iter().map(String::as_str).collect();
        match cmd.program_name() {
            "true" => CommandOutput::ok(""),
            "id" => self.id(&args),
            "test" => self.test(&args),
            "cat" => match args.first().and_then(|p| self.files.get(&self.resolve(Path::new(p)))) {
                Some(f) => CommandOutput::ok(f.contents.clone()),
                None => CommandOutput::failed(1, "cat: No such file or directory"),
            },
            "readlink" => match args.first().and_then(|p| self.links.get(&self.resolve_parent(Path::new(p)))) {
                Some(target) => CommandOutput::ok(format!("{}\n", target.display())),
                None => CommandOutput::failed(1, ""),
            },
            "install" => self.install(&args),
            "tee" => self.tee(&args, cmd.stdin.as_deref().unwrap_or_default(), &cmd.privilege),
            "rm" => {
                for p in args.iter().filter(|a| !a.starts_with('-')) {
                    let key = self.resolve_parent(Path::new(p));
                    self.files.remove(&key);
                    self.links.remove(&key);
                }
                CommandOutput::ok("")
            }
            "ln" => match args.as_slice() {
                ["-sfn", target, link] => {
                    let key = self.resolve_parent(Path::new(link));
                    self.files.remove(&key);
                    self.links.insert(key, PathBuf::from(target));
                    CommandOutput::ok("")
                }
                _ => CommandOutput::failed(1, "ln: unsupported arguments"),
            },
            "stat" => self.stat(&args),
            "chmod" => match args.as_slice() {
                [mode, path] => {
                    let key = self.resolve(Path::new(path));
                    match (self.files.get_mut(&key), u32::from_str_radix(mode, 8)) {
                        (Some(f), Ok(m)) => {
                            f.mode = m;
                            CommandOutput::ok("")
                        }
                        _ => CommandOutput::failed(1, "chmod: cannot access"),
                    }
                }
                _ => CommandOutput::failed(1, "chmod: unsupported arguments"),
            },
            "chown" => self.chown(&args),
            "apt-get" => self.apt_get(&args),
            "dpkg-query" => self.dpkg_query(&args),
            "useradd" => match args.last() {
                Some(name) if self.users.contains(*name) => {
                    CommandOutput::failed(9, format!("useradd: user '{name}' already exists"))
                }
                Some(name) => {
                    self.users.insert(name.to_string());
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(2, "useradd: missing user"),
            },
            "psql" => self.psql(cmd, &args),
            "pg_isready" => {
                if self.active("postgresql") {
                    CommandOutput::ok("/var/run/postgresql:5432 - accepting connections\n")
                } else {
                    CommandOutput::failed(2, "/var/run/postgresql:5432 - no response")
                }
            }
            "redis-cli" if args.contains(&"ping") => {
                if self.active("redis-server") {
                    CommandOutput::ok("PONG\n")
                } else {
                    CommandOutput::failed(1, "Could not connect to Redis at 127.0.0.1:6379: Connection refused")
                }
            }
            "systemctl" => self.systemctl(&args),
            "journalctl" => CommandOutput::ok("-- No entries --\n"),
            "curl" => match args.iter().position(|a| *a == "-o").and_then(|i| args.get(i + 1)) {
                Some(out) => {
                    let url = args.last().copied().unwrap_or_default();
                    let key = self.resolve_parent(Path::new(out));
                    self.files.insert(key, FakeFile::system(url));
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(2, "curl: no output file"),
            },
            "tar" => self.tar(&args),
            "python3" => match args.as_slice() {
                ["-m", "venv", dir] => {
                    let bin = self.resolve(Path::new(dir)).join("bin");
                    for exe in ["python", "pip"] {
                        self.files.insert(bin.join(exe), FakeFile { mode: 0o755, ..FakeFile::system("") });
                    }
                    CommandOutput::ok("")
                }
                _ => CommandOutput::failed(2, "python3: unsupported arguments"),
            },
            "pip" => self.pip(cmd, &args),
            "python" => self.manage_py(cmd, &args),
            "nginx" if args == ["-t"] => {
                CommandOutput { status: 0,
                                stdout: String::new(),
                                stderr: "nginx: configuration file /etc/nginx/nginx.conf test is successful\n".into() }
            }
            other => CommandOutput::failed(127, format!("{other}: command not found")),
        }
    }

    fn id(&self, args: &[&str]) -> CommandOutput {
        match args {
            ["-u"] => CommandOutput::ok(format!("{}\n", self.uid)),
            ["-u", name] if self.users.contains(*name) => CommandOutput::ok("998\n"),
            ["-u", name] => CommandOutput::failed(1, format!("id: '{name}': no such user")),
            _ => CommandOutput::failed(1, "id: unsupported arguments"),
        }
    }

    fn test(&self, args: &[&str]) -> CommandOutput {
        match args {
            ["-e", path] if self.exists(Path::new(path)) => CommandOutput::ok(""),
            ["-e", _] => CommandOutput::failed(1, ""),
            _ => CommandOutput::failed(2, "test: unsupported arguments"),
        }
    }

    fn install(&mut self, args: &[&str]) -> CommandOutput {
        let mut mode = 0o755;
        let mut owner = "root".to_string();
        let mut group = "root".to_string();
        let mut directory = false;
        let mut positional = Vec::new();
        let mut it = args.iter();
        while let Some(a) = it.next() {
            match *a {
                "-D" => {}
                "-d" => directory = true,
                "-m" => mode = it.next().and_then(|m| u32::from_str_radix(m, 8).ok()).unwrap_or(mode),
                "-o" => owner = it.next().map(|s| s.to_string()).unwrap_or(owner),
                "-g" => group = it.next().map(|s| s.to_string()).unwrap_or(group),
                other => positional.push(other),
            }
        }
        if !self.users.contains(&owner) {
            return CommandOutput::failed(1, format!("install: invalid user '{owner}'"));
        }
        if directory {
            for p in positional {
                let key = self.resolve(Path::new(p));
                self.dirs.insert(key, owner.clone());
            }
            return CommandOutput::ok("");
        }
        let [src, dest] = positional.as_slice() else {
            return CommandOutput::failed(1, "install: missing destination");
        };
        let contents = match *src {
            "/dev/null" => String::new(),
            other => match self.files.get(&self.resolve(Path::new(other))) {
                Some(f) => f.contents.clone(),
                None => return CommandOutput::failed(1, format!("install: cannot stat '{other}'")),
            },
        };
        let key = self.resolve_parent(Path::new(dest));
        self.links.remove(&key);
        self.files.insert(key, FakeFile { contents, mode, owner, group });
        CommandOutput::ok("")
    }

    /// Reproduce los permisos de apertura: un usuario sólo escribe lo suyo y,
    /// bajo `/tmp` (sticky con `protected_regular`), ni root abre un archivo
    /// ajeno.
    fn tee(&mut self, args: &[&str], input: &str, privilege: &Privilege) -> CommandOutput {
        let Some(path) = args.iter().find(|a| !a.starts_with('-')) else {
            return CommandOutput::failed(1, "tee: missing file");
        };
        let key = self.resolve(Path::new(path));
        let caller = match privilege {
            Privilege::User(u) => u.as_str(),
            Privilege::Root => "root",
            Privilege::Invoker => "invoker",
        };
        if let Some(existing) = self.files.get(&key) {
            let foreign = existing.owner != caller;
            if foreign && (caller != "root" || key.starts_with("/tmp")) {
                return CommandOutput::failed(1, format!("tee: {path}: Permission denied"));
            }
        }
        let file = self.files.entry(key).or_insert_with(|| FakeFile::system(""));
        file.contents = input.to_string();
        CommandOutput::ok(input)
    }

    fn stat(&self, args: &[&str]) -> CommandOutput {
        let ["-c", format, path] = args else {
            return CommandOutput::failed(1, "stat: unsupported arguments");
        };
        match (self.owner_of(Path::new(path)), *format) {
            (Some((owner, _)), "%U") => CommandOutput::ok(format!("{owner}\n")),
            (Some((_, mode)), "%a") => CommandOutput::ok(format!("{mode:o}\n")),
            (Some(_), _) => CommandOutput::failed(1, "stat: unsupported format"),
            (None, _) => CommandOutput::failed(1, format!("stat: cannot statx '{path}': No such file or directory")),
        }
    }

    fn chown(&mut self, args: &[&str]) -> CommandOutput {
        let ["-R", spec, path] = args else {
            return CommandOutput::failed(1, "chown: unsupported arguments");
        };
        let spec: &str = spec;
        let (owner, group) = spec.split_once(':').unwrap_or((spec, spec));
        if !self.users.contains(owner) {
            return CommandOutput::failed(1, format!("chown: invalid user: '{spec}'"));
        }
        let root = self.resolve(Path::new(path));
        if !self.exists(&root) {
            return CommandOutput::failed(1, format!("chown: cannot access '{path}'"));
        }
        self.dirs.insert(root.clone(), owner.to_string());
        for (k, f) in self.files.iter_mut() {
            if k.starts_with(&root) {
                f.owner = owner.to_string();
                f.group = group.to_string();
            }
        }
        for (k, o) in self.dirs.iter_mut() {
            if k.starts_with(&root) {
                *o = owner.to_string();
            }
        }
        CommandOutput::ok("")
    }

    fn apt_get(&mut self, args: &[&str]) -> CommandOutput {
        if args.contains(&"update") || args.contains(&"upgrade") {
            return CommandOutput::ok("");
        }
        if !args.contains(&"install") {
            return CommandOutput::failed(100, "E: Invalid operation");
        }
        for pkg in args.iter().filter(|a| !a.starts_with('-') && **a != "install") {
            self.packages.insert(pkg.to_string());
            match *pkg {
                "postgresql" => {
                    self.users.insert("postgres".into());
                    self.services.insert("postgresql".into(), running());
                }
                "redis-server" => {
                    self.users.insert("redis".into());
                    self.services.insert("redis-server".into(), running());
                }
                "nginx" => {
                    self.users.insert("www-data".into());
                    self.services.insert("nginx".into(), running());
                    let site = PathBuf::from("/etc/nginx/sites-available/default");
                    self.files.insert(site.clone(), FakeFile::system("server { listen 80 default_server; }\n"));
                    self.links.insert(PathBuf::from("/etc/nginx/sites-enabled/default"), site);
                }
                _ => {}
            }
        }
        CommandOutput::ok("")
    }

    fn dpkg_query(&self, args: &[&str]) -> CommandOutput {
        let mut out = String::new();
        let mut missing = String::new();
        for pkg in args.iter().filter(|a| !a.starts_with('-')) {
            if self.packages.contains(*pkg) {
                out.push_str(&format!("{pkg} install ok installed\n"));
            } else {
                missing.push_str(&format!("dpkg-query: no packages found matching {pkg}\n"));
            }
        }
        CommandOutput { status: if missing.is_empty() { 0 } else { 1 },
                        stdout: out,
                        stderr: missing }
    }

    fn systemctl(&mut self, args: &[&str]) -> CommandOutput {
        let (verb, unit) = match args {
            ["daemon-reload"] => return CommandOutput::ok(""),
            ["enable", "--now", unit] => ("enable-now", *unit),
            [verb, unit] => (*verb, *unit),
            _ => return CommandOutput::failed(1, "systemctl: unsupported arguments"),
        };
        let unit_file = PathBuf::from(format!("/etc/systemd/system/{unit}.service"));
        if !self.services.contains_key(unit) && self.files.contains_key(&unit_file) {
            self.services.insert(unit.to_string(), FakeService::default());
        }
        let Some(svc) = self.services.get_mut(unit) else {
            return match verb {
                "is-active" | "is-enabled" => CommandOutput { status: 4,
                                                              stdout: "inactive\n".into(),
                                                              stderr: String::new() },
                _ => CommandOutput::failed(5, format!("Failed to {verb} {unit}.service: Unit {unit}.service not found.")),
            };
        };
        match verb {
            "is-active" if svc.active => CommandOutput::ok("active\n"),
            "is-active" => CommandOutput { status: 3,
                                           stdout: "inactive\n".into(),
                                           stderr: String::new() },
            "is-enabled" if svc.enabled => CommandOutput::ok("enabled\n"),
            "is-enabled" => CommandOutput { status: 1,
                                            stdout: "disabled\n".into(),
                                            stderr: String::new() },
            "enable-now" | "start" | "restart" => {
                if verb == "enable-now" {
                    svc.enabled = true;
                }
                if svc.fail_start {
                    svc.active = false;
                    return CommandOutput::failed(1, format!("Job for {unit}.service failed because the control process exited with error code."));
                }
                svc.active = true;
                CommandOutput::ok("")
            }
            "enable" => {
                svc.enabled = true;
                CommandOutput::ok("")
            }
            "stop" => {
                svc.active = false;
                CommandOutput::ok("")
            }
            "disable" => {
                svc.enabled = false;
                CommandOutput::ok("")
            }
            "reload" if svc.active => CommandOutput::ok(""),
            "reload" => CommandOutput::failed(1, format!("{unit}.service is not active, cannot reload.")),
            _ => CommandOutput::failed(1, format!("systemctl: unknown verb {verb}")),
        }
    }

    fn tar(&mut self, args: &[&str]) -> CommandOutput {
        let ["-xzf", tarball, "-C", dest] = args else {
            return CommandOutput::failed(2, "tar: unsupported arguments");
        };
        if !self.is_file(Path::new(tarball)) {
            return CommandOutput::failed(2, format!("tar: {tarball}: Cannot open: No such file or directory"));
        }
        let name = Path::new(tarball).file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some(version) = name.strip_prefix("netbox-v").and_then(|n| n.strip_suffix(".tar.gz")) else {
            return CommandOutput::failed(2, "tar: not a NetBox release archive");
        };
        let release = self.resolve(Path::new(dest)).join(format!("netbox-{version}"));
        for file in ["netbox/manage.py",
                     "netbox/netbox/configuration_example.py",
                     "requirements.txt",
                     "contrib/netbox-housekeeping.sh"]
        {
            self.files.insert(release.join(file), FakeFile::system(file));
        }
        for dir in ["netbox/media", "netbox/reports", "netbox/scripts"] {
            self.dirs.insert(release.join(dir), "root".into());
        }
        CommandOutput::ok("")
    }

    fn pip(&mut self, cmd: &CommandSpec, args: &[&str]) -> CommandOutput {
        let Some(venv) = Path::new(&cmd.program).parent().and_then(Path::parent) else {
            return CommandOutput::failed(1, "pip: bad path");
        };
        if let Some(req) = args.iter().position(|a| *a == "-r").and_then(|i| args.get(i + 1)) {
            if !self.is_file(Path::new(req)) {
                return CommandOutput::failed(1, format!("ERROR: Could not open requirements file: {req}"));
            }
            let gunicorn = self.resolve(venv).join("bin/gunicorn");
            self.files.insert(gunicorn, FakeFile { mode: 0o755, ..FakeFile::system("") });
        }
        CommandOutput::ok("")
    }

    fn manage_py(&mut self, cmd: &CommandSpec, args: &[&str]) -> CommandOutput {
        let Some((manage, rest)) = args.split_first() else {
            return CommandOutput::failed(2, "python: missing script");
        };
        let manage = Path::new(manage);
        if !self.is_file(manage) {
            return CommandOutput::failed(2, format!("python: can't open file '{}'", manage.display()));
        }
        let project = manage.parent().map(Path::to_path_buf).unwrap_or_default();
        let config = project.join("netbox/configuration.py");
        let needs_db = matches!(rest.first(), Some(&"migrate"));
        if !self.is_file(&config) {
            return CommandOutput::failed(1, "django.core.exceptions.ImproperlyConfigured: configuration.py not found");
        }
        if needs_db && !self.active("postgresql") {
            return CommandOutput::failed(1, "django.db.utils.OperationalError: connection refused");
        }
        match rest {
            ["migrate", "--check"] if self.migrations_pending => CommandOutput::failed(1, "unapplied migrations"),
            ["migrate", "--check"] => CommandOutput::ok(""),
            ["migrate", ..] => {
                self.migrations_pending = false;
                CommandOutput::ok("Operations to perform: Apply all migrations\n")
            }
            ["collectstatic", ..] => {
                let owner = match &cmd.privilege {
                    Privilege::User(u) => u.clone(),
                    _ => "root".to_string(),
                };
                let key = self.resolve(&project.join("static"));
                self.dirs.insert(key, owner);
                self.static_collected = true;
                CommandOutput::ok("static files copied\n")
            }
            ["check"] => CommandOutput::ok("System check identified no issues (0 silenced).\n"),
            _ => CommandOutput::failed(1, "Unknown command"),
        }
    }

    fn psql(&mut self, cmd: &CommandSpec, args: &[&str]) -> CommandOutput {
        if !self.active("postgresql") {
            return CommandOutput::failed(2, "psql: error: connection to server on socket failed: No such file or directory");
        }
        let flag = |name: &str| args.iter().position(|a| *a == name).and_then(|i| args.get(i + 1)).copied();
        if let Some(_host) = flag("-h") {
            let user = flag("-U").unwrap_or_default();
            let db = flag("-d").unwrap_or_default();
            let password = cmd.env.iter().find(|(k, _)| k == "PGPASSWORD").map(|(_, v)| v.as_str());
            if self.pg_roles.get(user).map(String::as_str) != password || password.is_none() {
                return CommandOutput::failed(2, format!("psql: error: FATAL:  password authentication failed for user \"{user}\""));
            }
            if !self.pg_databases.contains_key(db) {
                return CommandOutput::failed(2, format!("psql: error: FATAL:  database \"{db}\" does not exist"));
            }
            return CommandOutput::ok("1\n");
        }
        if cmd.privilege != Privilege::User("postgres".into()) {
            return CommandOutput::failed(2, "psql: error: FATAL:  Peer authentication failed");
        }
        if let Some(query) = flag("-tAc").or_else(|| flag("-c")) {
            let found = if let Some(name) = quoted_after(query, "rolname=") {
                self.pg_roles.contains_key(&name)
            } else if let Some(name) = quoted_after(query, "datname=") {
                self.pg_databases.contains_key(&name)
            } else {
                false
            };
            return CommandOutput::ok(if found { "1\n" } else { "" });
        }
        let sql = cmd.stdin.clone().unwrap_or_default();
        for stmt in sql.split(";\n").map(str::trim).filter(|s| !s.is_empty()) {
            if stmt.starts_with("CREATE ROLE") || stmt.starts_with("ALTER ROLE") {
                let (Some(role), Some(password)) = (quoted_after(stmt, "ROLE "), quoted_after(stmt, "PASSWORD ")) else {
                    return CommandOutput::failed(3, "ERROR:  syntax error");
                };
                if stmt.starts_with("CREATE") && self.pg_roles.contains_key(&role) {
                    return CommandOutput::failed(3, format!("ERROR:  role \"{role}\" already exists"));
                }
                if stmt.starts_with("ALTER") && !self.pg_roles.contains_key(&role) {
                    return CommandOutput::failed(3, format!("ERROR:  role \"{role}\" does not exist"));
                }
                self.pg_roles.insert(role, password);
            } else if stmt.starts_with("CREATE DATABASE") {
                let (Some(db), Some(owner)) = (quoted_after(stmt, "DATABASE "), quoted_after(stmt, "OWNER ")) else {
                    return CommandOutput::failed(3, "ERROR:  syntax error");
                };
                if self.pg_databases.contains_key(&db) {
                    return CommandOutput::failed(3, format!("ERROR:  database \"{db}\" already exists"));
                }
                self.pg_databases.insert(db, owner);
            } else if !stmt.starts_with("GRANT") && !stmt.starts_with("ALTER DATABASE") {
                return CommandOutput::failed(3, "ERROR:  unsupported statement");
            }
        }
        CommandOutput::ok("")
    }
}

fn running() -> FakeService {
    FakeService { enabled: true,
                  active: true,
                  fail_start: false }
}

/// Valor del identificador (`"..."`) o literal (`'...'`) SQL que sigue a
/// `marker`, con la comilla duplicada des-escapada.
fn quoted_after(text: &str, marker: &str) -> Option<String> {
    let rest = &text[text.find(marker)? + marker.len()..];
    let mut chars = rest.chars().peekable();
    let quote = chars.next().filter(|c| *c == '"' || *c == '\'')?;
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                value.push(quote);
                continue;
            }
            return Some(value);
        }
        value.push(c);
    }
    None
}
