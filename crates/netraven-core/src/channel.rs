use crate::error::NetsshError;
use regex::Regex;
use ssh2::Channel as SSH2Channel;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

// Optimal buffer size based on typical network device response sizes
const DEFAULT_BUFFER_SIZE: usize = 16384; // 16KB

pub struct SSHChannel {
    remote_conn: RefCell<Option<SSH2Channel>>,
    base_prompt: Option<String>,
    prompt_regex: Option<Regex>,
    // Add a reusable buffer to avoid allocations
    read_buffer: RefCell<Vec<u8>>,
}

impl SSHChannel {
    pub fn new(conn: Option<SSH2Channel>) -> Self {
        Self {
            remote_conn: RefCell::new(conn),
            base_prompt: None,
            prompt_regex: None,
            read_buffer: RefCell::new(Vec::with_capacity(DEFAULT_BUFFER_SIZE)),
        }
    }

    pub fn set_base_prompt(&mut self, prompt: &str) {
        debug!(target: "SSHChannel::set_base_prompt", "Setting base prompt to: {}", prompt);
        self.base_prompt = Some(prompt.to_string());

        // Create a regex that matches the prompt followed by > or #
        let prompt_pattern = format!(r"{}[>#]", regex::escape(prompt));
        match Regex::new(&prompt_pattern) {
            Ok(re) => {
                debug!(target: "SSHChannel::set_base_prompt", "Created prompt regex: {}", prompt_pattern);
                self.prompt_regex = Some(re);
            }
            Err(e) => {
                debug!(target: "SSHChannel::set_base_prompt", "Failed to create prompt regex: {}", e);
            }
        }
    }

    pub fn write_channel(&self, out_data: &str) -> Result<(), NetsshError> {
        debug!(target: "SSHChannel::write_channel", "Writing to channel: {:?}", out_data);

        let mut remote_conn = self.remote_conn.borrow_mut();
        let channel = remote_conn.as_mut().ok_or_else(|| {
            NetsshError::WriteError(
                "Attempt to write data, but there is no active channel.".to_string(),
            )
        })?;

        // Convert string to bytes and write to channel
        let bytes = out_data.as_bytes();
        channel
            .write_all(bytes)
            .map_err(|e| NetsshError::WriteError(format!("Failed to write to channel: {}", e)))?;

        // Flush the channel to ensure all data is sent
        channel
            .flush()
            .map_err(|e| NetsshError::WriteError(format!("Failed to flush channel: {}", e)))?;

        debug!(target: "SSHChannel::write_channel", "Successfully wrote to channel");
        Ok(())
    }

    pub fn read_buffer(&self, prompt_regex: Option<&Regex>) -> Result<String, NetsshError> {
        debug!(target: "SSHChannel::read_buffer", "Reading buffer from channel");

        let mut remote_conn = self.remote_conn.borrow_mut();
        let channel = remote_conn.as_mut().ok_or_else(|| {
            NetsshError::ReadError("Attempt to read, but there is no active channel.".to_string())
        })?;

        // Reuse the existing buffer instead of allocating a new one
        let mut buffer = self.read_buffer.borrow_mut();

        // Ensure buffer has enough capacity, but don't reallocate if already adequate
        let current_capacity = buffer.capacity();
        if current_capacity < DEFAULT_BUFFER_SIZE {
            buffer.reserve(DEFAULT_BUFFER_SIZE - current_capacity);
        }

        // Clear but preserve capacity
        buffer.clear();

        // Resize to capacity for reading
        let capacity = buffer.capacity();
        buffer.resize(capacity, 0);

        let mut output = String::with_capacity(DEFAULT_BUFFER_SIZE);

        // Check if data is available
        debug!(target: "SSHChannel::read_buffer", "Checking if data is available to read");
        match channel.read(&mut buffer) {
            Ok(n) if n > 0 => {
                debug!(target: "SSHChannel::read_buffer", "Read {} bytes from channel", n);

                // Convert only the valid bytes (0..n) to a string to avoid UTF-8 validation on unused parts
                let chunk = match std::str::from_utf8(&buffer[..n]) {
                    Ok(s) => s.to_string(),
                    Err(e) => {
                        debug!(target: "SSHChannel::read_buffer", "UTF-8 conversion error: {}", e);
                        // Fallback to lossy conversion only when needed
                        String::from_utf8_lossy(&buffer[..n]).to_string()
                    }
                };

                output.push_str(&chunk);

                // Check if we found the prompt
                if let Some(re) = prompt_regex {
                    if re.is_match(&output) {
                        debug!(target: "SSHChannel::read_buffer", "Found prompt in output");
                    }
                } else if let Some(ref re) = self.prompt_regex {
                    if re.is_match(&output) {
                        debug!(target: "SSHChannel::read_buffer", "Found prompt in output using default prompt regex");
                    }
                }
            }
            Ok(0) => {
                debug!(target: "SSHChannel::read_buffer", "Channel stream closed by remote device");
                return Err(NetsshError::ReadError(
                    "Channel stream closed by remote device.".to_string(),
                ));
            }
            Ok(_) => {
                debug!(target: "SSHChannel::read_buffer", "No data available to read");
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!(target: "SSHChannel::read_buffer", "Would block, no data available");
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                debug!(target: "SSHChannel::read_buffer", "Timed out, no data available");
            }
            Err(e) => {
                debug!(target: "SSHChannel::read_buffer", "Error reading from channel: {}", e);
                return Err(NetsshError::IoError(e));
            }
        }

        debug!(target: "SSHChannel::read_buffer", "Read buffer result length: {}", output.len());
        debug!(target: "SSHChannel::read_buffer", "Read buffer result: {}", output);
        Ok(output)
    }

    pub fn read_until_prompt(
        &self,
        timeout: Option<Duration>,
        custom_prompt: Option<&Regex>,
    ) -> Result<String, NetsshError> {
        debug!(target: "SSHChannel::read_until_prompt", "Reading until prompt");

        // Check if we have a channel
        if self.remote_conn.borrow().is_none() {
            return Err(NetsshError::ReadError(
                "Attempt to read, but there is no active channel.".to_string(),
            ));
        }

        // Check if we have a prompt regex
        let prompt_regex = if let Some(re) = custom_prompt {
            re
        } else {
            match &self.prompt_regex {
                Some(re) => re,
                None => return Err(NetsshError::ReadError("No prompt regex set".to_string())),
            }
        };

        let mut output = String::new();
        let start_time = std::time::Instant::now();
        let timeout = timeout.unwrap_or(Duration::from_secs(10));

        // Keep reading until we find the prompt or timeout
        while start_time.elapsed() < timeout {
            let new_output = self.read_buffer(Some(prompt_regex))?;
            if new_output.is_empty() {
                break;
            }
            output.push_str(&new_output);

            // Check if we found the prompt
            if prompt_regex.is_match(&output) {
                debug!(target: "SSHChannel::read_until_prompt", "Found prompt, breaking read loop");
                break;
            }
        }

        if start_time.elapsed() >= timeout {
            debug!(target: "SSHChannel::read_until_prompt", "Timeout reached waiting for prompt");
            return Err(NetsshError::TimeoutError(
                "Timeout waiting for prompt".to_string(),
            ));
        }

        debug!(target: "SSHChannel::read_until_prompt", "Read result: {:?}", output);
        Ok(output)
    }

    pub fn set_remote_conn(&self, conn: SSH2Channel) {
        *self.remote_conn.borrow_mut() = Some(conn);
    }

    pub fn is_some(&self) -> bool {
        self.remote_conn.borrow().is_some()
    }

    /// Close the SSH channel
    pub fn close(&self) -> Result<(), NetsshError> {
        debug!(target: "SSHChannel::close", "Closing channel");

        if let Some(mut channel) = self.remote_conn.borrow_mut().take() {
            // Send EOF to indicate we're done sending data
            if let Err(e) = channel.send_eof() {
                debug!(target: "SSHChannel::close", "Error sending EOF: {}", e);
            }

            // Close the channel
            if let Err(e) = channel.close() {
                debug!(target: "SSHChannel::close", "Error closing channel: {}", e);
                return Err(NetsshError::ChannelError(format!(
                    "Failed to close channel: {}",
                    e
                )));
            }

            // Wait for channel to close
            if let Err(e) = channel.wait_close() {
                debug!(target: "SSHChannel::close", "Error waiting for channel to close: {}", e);
                return Err(NetsshError::ChannelError(format!(
                    "Failed to wait for channel close: {}",
                    e
                )));
            }

            debug!(target: "SSHChannel::close", "Channel closed successfully");
        } else {
            debug!(target: "SSHChannel::close", "No active channel to close");
        }

        Ok(())
    }
}
