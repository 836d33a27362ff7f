use std::path::PathBuf;

/// The default config file lookup from `get_def_config`: `$KPLEXCONF` if
/// set (used verbatim, existence unchecked — matching the original, which
/// trusts an explicit override); else `$HOME/.kplex.conf` if it exists;
/// else `/etc/kplex.conf` if it exists; else `None`, meaning "run with no
/// config file".
pub fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KPLEXCONF") {
        return Some(PathBuf::from(path));
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        let home_conf = base_dirs.home_dir().join(".kplex.conf");
        if home_conf.exists() {
            return Some(home_conf);
        }
    }

    let global_conf = PathBuf::from("/etc/kplex.conf");
    if global_conf.exists() {
        return Some(global_conf);
    }

    None
}
