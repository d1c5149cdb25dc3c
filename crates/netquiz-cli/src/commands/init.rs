//! The `netquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("netquiz.toml").exists() {
        println!("netquiz.toml already exists, skipping.");
    } else {
        std::fs::write("netquiz.toml", SAMPLE_CONFIG)?;
        println!("Created netquiz.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit netquiz.toml with the candidate and EmailJS details");
    println!("  2. Run: netquiz validate --bank banks/example.toml");
    println!("  3. Run: netquiz start");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# netquiz configuration

question_bank = "banks/example.toml"
state_dir = "./.netquiz"

[candidate]
name = "Unknown Candidate"
email = "Not provided"

# Log reports instead of sending them. Switch to EmailJS with:
#
# [gateway]
# type = "emailjs"
# service_id = "service_xxxxxxx"
# completion_template_id = "template_completed"
# termination_template_id = "template_terminated"
# public_key = "${NETQUIZ_EMAILJS_PUBLIC_KEY}"
# recipient_email = "hiring@example.com"
[gateway]
type = "log"

[rate_limit]
cooldown_ms = 30000
max_per_hour = 2
min_session_time_ms = 10000
once_per_kind_per_session = true

[integrity]
min_dwell_ms = 10000
viewport_gap_threshold = 160
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small example bank to get started"

[[questions]]
id = 1
kind = "single"
category = "OSI Model"
prompt = "Which OSI layer is responsible for routing packets between networks?"
options = ["Data Link", "Network", "Transport", "Session"]
correct = [46306]

[[questions]]
id = 2
kind = "multiple"
category = "Transport"
prompt = "Which of the following are connectionless protocols?"
options = ["UDP", "TCP", "ICMP", "SCTP"]
correct = [46307, 46333]

[[questions]]
id = 3
kind = "coding"
category = "Sockets"
language = "python"
prompt = "Open a UDP socket and send the bytes b'ping' to 127.0.0.1:9000."
placeholder = "import socket\n"
reference_solution = """
import socket

sock = socket.socket(socket.AF_INET, socket.SOCK_DGRAM)
sock.sendto(b"ping", ("127.0.0.1", 9000))
sock.close()
"""
"#;
