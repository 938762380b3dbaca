//! Setup guide for sikuli-remote-server
//!
//! This module contains the guide text displayed by `sikuli-remote-server guide`.

use sikuli_remote_protocol::default_engine_socket_path;

/// Print the setup guide to stdout
pub fn print_guide() {
    let version = env!("CARGO_PKG_VERSION");
    let socket = default_engine_socket_path();
    let socket = socket.display();
    print!(
        r#"
================================================================================
                      sikuli-remote-server Setup Guide
                              Version {version}
================================================================================

This guide explains how to run the keyword server and call it from a remote
test runner or an MCP client.

--------------------------------------------------------------------------------
STEP 1: Start a screen engine
--------------------------------------------------------------------------------

The server locates images and performs input through a screen engine process
listening on a Unix socket. By default the socket is:

    {socket}

Use `--engine-socket <PATH>` to point at another socket. Without an engine,
`--virtual-screen` runs against an empty in-memory 1920x1080 screen, which is
enough to check a suite's wiring:

    sikuli-remote-server --virtual-screen serve 10000
    sikuli-remote-server --virtual-screen=1280x720 serve 10000

--------------------------------------------------------------------------------
STEP 2: Serve keywords over TCP
--------------------------------------------------------------------------------

    sikuli-remote-server serve <PORT> [CAPTURE_FOLDER]

Screenshots of failed waits are written to `<CAPTURE_FOLDER>/sikuli_captured/`
(default: the working directory) and referenced from the report output as:

    *HTML* <img src='sikuli_captured/<file>'/>

Report lines are echoed to stdout while serving. Stop the server with the
`Stop Remote Server` keyword.

--------------------------------------------------------------------------------
STEP 3 (optional): Configure an MCP client
--------------------------------------------------------------------------------

Create or edit `.mcp.json` in your project root:

    {{
      "mcpServers": {{
        "sikuli-remote": {{
          "command": "sikuli-remote-server",
          "args": ["mcp"],
          "env": {{
            "RUST_LOG": "info"
          }}
        }}
      }}
    }}

For cargo-based development, use:

    {{
      "mcpServers": {{
        "sikuli-remote": {{
          "command": "cargo",
          "args": ["run", "-p", "sikuli-remote-server", "--", "mcp"]
        }}
      }}
    }}

--------------------------------------------------------------------------------
ENVIRONMENT VARIABLES
--------------------------------------------------------------------------------

  XDG_RUNTIME_DIR      Directory holding the default engine socket
  RUST_LOG             Log level (e.g., "info", "debug"); logs go to stderr

--------------------------------------------------------------------------------
REMOTE CALLS / MCP TOOLS
--------------------------------------------------------------------------------

  - get_keyword_names          List every keyword
  - get_keyword_documentation  Documentation of a keyword (or __intro__)
  - get_keyword_arguments      Argument specification of a keyword
  - run_keyword                Run a keyword with positional and named args

Keyword names ignore case, spaces and underscores: `Click In`, `click_in` and
`clickin` are the same keyword.

================================================================================
"#
    );
}
