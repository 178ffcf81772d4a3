use crate::matcher::normalize;

pub const SYSTEM_COMMANDS: &[(&str, &str)] = &[
    ("калькулятор", "calc"),
    ("calc", "calc"),
    ("calculator", "calc"),
    ("блокнот", "notepad"),
    ("notepad", "notepad"),
    ("paint", "mspaint"),
    ("паинт", "mspaint"),
    ("проводник", "explorer"),
    ("explorer", "explorer"),
    ("диспетчер задач", "taskmgr"),
    ("task manager", "taskmgr"),
    ("taskmgr", "taskmgr"),
    ("cmd", "cmd"),
    ("командная строка", "cmd"),
    ("powershell", "powershell"),
    ("павершелл", "powershell"),
    ("anydesk", "AnyDesk"),
    ("энни дэск", "AnyDesk"),
];

pub fn lookup(phrase: &str) -> Option<&'static str> {
    let normalized = normalize(phrase);
    SYSTEM_COMMANDS
        .iter()
        .find(|(spoken, _)| *spoken == normalized)
        .map(|(_, token)| *token)
}

pub fn is_bare_token(target: &str) -> bool {
    !target.contains(['\\', '/'])
        && SYSTEM_COMMANDS.iter().any(|(_, token)| *token == target)
}
