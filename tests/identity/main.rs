// Identity tests - addresses, DIDs and seed phrases
